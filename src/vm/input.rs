pub const KEY_COUNT: u8 = 16;

/// State of the 16-key hex keypad.
/// Bit `n` of the packed state is set while key `n` is held down.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Keypad {
    down_keys: u16,
}

impl Keypad {
    pub fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        let key = key & 0xF;
        if pressed {
            self.down_keys |= 1 << key;
        } else {
            self.down_keys &= !(1 << key);
        }
        log::debug!(
            "key {:X} {} (bitmap {:#018b})",
            key,
            if pressed { "down" } else { "up" },
            self.down_keys
        );
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.down_keys >> (key & 0xF) & 1 == 1
    }

    // lowest numbered key wins when several are held
    pub fn first_pressed(&self) -> Option<u8> {
        if self.down_keys == 0 {
            None
        } else {
            Some(self.down_keys.trailing_zeros() as u8)
        }
    }

    pub fn down_keys(&self) -> u16 {
        self.down_keys
    }

    pub fn clear(&mut self) {
        self.down_keys = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::default();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        assert!(!keypad.is_pressed(0xB));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
        assert_eq!(keypad.down_keys(), 0);
    }

    #[test]
    fn keys_are_masked_to_a_nibble() {
        let mut keypad = Keypad::default();
        keypad.press(0x1F);
        assert!(keypad.is_pressed(0xF));
        assert!(keypad.is_pressed(0x3F));
    }

    #[test]
    fn first_pressed_picks_lowest() {
        let mut keypad = Keypad::default();
        assert_eq!(keypad.first_pressed(), None);
        keypad.press(0xC);
        keypad.press(0x5);
        assert_eq!(keypad.first_pressed(), Some(0x5));
        keypad.clear();
        assert_eq!(keypad.first_pressed(), None);
    }
}
