//! Stimmen-Katalog – fester Satz erlaubter Stimmen
//!
//! Stimmen ausserhalb des Katalogs werden niemals als Fehler an den
//! Client gemeldet, sondern stillschweigend durch die Standardstimme
//! ersetzt. Die an die Engine weitergereichte Stimme ist dadurch immer
//! ein Mitglied des Katalogs.

use std::collections::HashSet;

/// Standardstimme wenn der Client keine (oder eine unbekannte) nennt
pub const STANDARD_STIMME: &str = "en-GB-RyanNeural";

/// Der feste Satz erlaubter Stimmen
pub fn standard_katalog() -> Vec<String> {
    [
        "en-GB-RyanNeural",
        "en-US-GuyNeural",
        "en-US-JennyNeural",
        "en-US-AriaNeural",
        "en-GB-SoniaNeural",
        "en-AU-NatashaNeural",
        "en-AU-WilliamNeural",
        "en-IN-NeerjaNeural",
        "en-IN-PrabhatNeural",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Katalog erlaubter Stimmen mit Standardstimme
#[derive(Debug, Clone)]
pub struct StimmenKatalog {
    erlaubt: HashSet<String>,
    standard: String,
}

impl StimmenKatalog {
    /// Erstellt einen Katalog aus Standardstimme und Erlaubt-Liste.
    ///
    /// Die Standardstimme ist immer Teil des Katalogs, auch wenn sie in
    /// der Liste fehlt.
    pub fn neu(standard: impl Into<String>, erlaubt: Vec<String>) -> Self {
        let standard = standard.into();
        let mut erlaubt: HashSet<String> = erlaubt.into_iter().collect();
        erlaubt.insert(standard.clone());
        Self { erlaubt, standard }
    }

    /// Prueft ob eine Stimme im Katalog enthalten ist
    pub fn ist_erlaubt(&self, stimme: &str) -> bool {
        self.erlaubt.contains(stimme)
    }

    /// Gibt die Standardstimme zurueck
    pub fn standard(&self) -> &str {
        &self.standard
    }

    /// Loest einen Stimmen-Wunsch zum tatsaechlich verwendeten Wert auf.
    ///
    /// Fehlende oder unbekannte Stimmen werden stillschweigend durch die
    /// Standardstimme ersetzt – nie als Fehler gemeldet.
    pub fn aufloesen<'a>(&'a self, wunsch: Option<&'a str>) -> &'a str {
        match wunsch {
            Some(stimme) if self.ist_erlaubt(stimme) => stimme,
            Some(stimme) => {
                tracing::warn!(
                    stimme = %stimme,
                    standard = %self.standard,
                    "Unbekannte Stimme, verwende Standardstimme"
                );
                &self.standard
            }
            None => &self.standard,
        }
    }
}

impl Default for StimmenKatalog {
    fn default() -> Self {
        Self::neu(STANDARD_STIMME, standard_katalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_katalog_enthaelt_standardstimme() {
        let katalog = StimmenKatalog::default();
        assert!(katalog.ist_erlaubt(STANDARD_STIMME));
        assert_eq!(katalog.standard(), STANDARD_STIMME);
    }

    #[test]
    fn bekannte_stimme_bleibt_erhalten() {
        let katalog = StimmenKatalog::default();
        assert_eq!(
            katalog.aufloesen(Some("en-US-JennyNeural")),
            "en-US-JennyNeural"
        );
    }

    #[test]
    fn unbekannte_stimme_wird_ersetzt() {
        let katalog = StimmenKatalog::default();
        assert_eq!(katalog.aufloesen(Some("de-DE-Erfunden")), STANDARD_STIMME);
    }

    #[test]
    fn fehlende_stimme_wird_ersetzt() {
        let katalog = StimmenKatalog::default();
        assert_eq!(katalog.aufloesen(None), STANDARD_STIMME);
    }

    #[test]
    fn standardstimme_immer_im_katalog() {
        let katalog = StimmenKatalog::neu("x-custom", vec!["a".into(), "b".into()]);
        assert!(katalog.ist_erlaubt("x-custom"));
        assert_eq!(katalog.aufloesen(None), "x-custom");
    }
}
