use palette::Srgba;

/// Bulb colors shared by every pattern, addressed by the indices in a
/// pattern sequence.
pub struct Palette {
    colors: Vec<Srgba<u8>>,
}

impl Palette {
    pub fn christmas() -> Palette {
        Palette {
            colors: vec![
                Srgba::new(255, 16, 16, 255),
                Srgba::new(16, 255, 16, 255),
                Srgba::new(16, 16, 255, 255),
                Srgba::new(255, 255, 16, 255),
                Srgba::new(16, 255, 255, 255),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn contains(&self, index: u64) -> bool {
        index < self.colors.len() as u64
    }

    pub fn get(&self, index: u8) -> Option<Srgba<u8>> {
        self.colors.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn christmas_palette_has_five_opaque_colors() {
        let palette = Palette::christmas();
        assert_eq!(palette.len(), 5);
        for index in 0..5 {
            let color = palette.get(index).unwrap();
            assert_eq!(color.alpha, 255);
        }
        assert_eq!(palette.get(0), Some(Srgba::new(255, 16, 16, 255)));
        assert_eq!(palette.get(4), Some(Srgba::new(16, 255, 255, 255)));
    }

    #[test]
    fn lookup_past_the_end_is_rejected() {
        let palette = Palette::christmas();
        assert_eq!(palette.get(5), None);
        assert!(palette.contains(4));
        assert!(!palette.contains(5));
        assert!(!palette.contains(u64::MAX));
    }
}
