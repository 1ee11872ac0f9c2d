use serde::{Deserialize, Serialize};
use std::fmt;

/// The only city the assistant books for.
pub const SUPPORTED_CITY: &str = "Bengaluru";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attraction {
    #[serde(rename = "Bangalore Palace")]
    BangalorePalace,
    #[serde(rename = "Lalbagh Botanical Garden")]
    LalbaghBotanicalGarden,
    #[serde(rename = "Visvesvaraya Technological Museum")]
    VisvesvarayaTechnologicalMuseum,
    #[serde(rename = "Bannerghatta National Park")]
    BannerghattaNationalPark,
}

impl Attraction {
    /// In the order the assistant lists them as options a) to d).
    pub const ALL: [Attraction; 4] = [
        Attraction::BangalorePalace,
        Attraction::LalbaghBotanicalGarden,
        Attraction::VisvesvarayaTechnologicalMuseum,
        Attraction::BannerghattaNationalPark,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attraction::BangalorePalace => "Bangalore Palace",
            Attraction::LalbaghBotanicalGarden => "Lalbagh Botanical Garden",
            Attraction::VisvesvarayaTechnologicalMuseum => "Visvesvaraya Technological Museum",
            Attraction::BannerghattaNationalPark => "Bannerghatta National Park",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Attraction::BangalorePalace => {
                "A magnificent palace with Tudor-style architecture,\n   featuring beautiful gardens and royal interiors."
            }
            Attraction::LalbaghBotanicalGarden => {
                "A beautiful garden spanning 240 acres with rare plants,\n   a glasshouse, and a serene lake."
            }
            Attraction::VisvesvarayaTechnologicalMuseum => {
                "An interactive science and technology museum with\n   engaging exhibits and hands-on demonstrations."
            }
            Attraction::BannerghattaNationalPark => {
                "A wildlife sanctuary offering exciting safari experiences\n   and a chance to see animals in their natural habitat."
            }
        }
    }

    /// Option letter shown next to the attraction in the menu.
    pub fn option_letter(&self) -> char {
        match self {
            Attraction::BangalorePalace => 'a',
            Attraction::LalbaghBotanicalGarden => 'b',
            Attraction::VisvesvarayaTechnologicalMuseum => 'c',
            Attraction::BannerghattaNationalPark => 'd',
        }
    }

    /// Matches a summary label value against the catalogue.
    ///
    /// Case-insensitive; tolerates the menu prefix (`"b) Lalbagh Botanical Garden"`).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let label = match label.split_once(") ") {
            Some((prefix, rest)) if prefix.len() == 1 => rest.trim(),
            _ => label,
        };

        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Attraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_exact_and_case_insensitive() {
        assert_eq!(
            Attraction::from_label("Lalbagh Botanical Garden"),
            Some(Attraction::LalbaghBotanicalGarden)
        );
        assert_eq!(
            Attraction::from_label("  bangalore palace "),
            Some(Attraction::BangalorePalace)
        );
    }

    #[test]
    fn test_from_label_with_menu_prefix() {
        assert_eq!(
            Attraction::from_label("d) Bannerghatta National Park"),
            Some(Attraction::BannerghattaNationalPark)
        );
    }

    #[test]
    fn test_from_label_unknown() {
        assert_eq!(Attraction::from_label("Cubbon Park"), None);
        assert_eq!(Attraction::from_label(""), None);
    }

    #[test]
    fn test_serializes_as_display_name() {
        let json = serde_json::to_string(&Attraction::VisvesvarayaTechnologicalMuseum).unwrap();
        assert_eq!(json, "\"Visvesvaraya Technological Museum\"");
    }
}
