//! Fehlertypen fuer Mouthpiece
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Mouthpiece
pub type Result<T> = std::result::Result<T, GatewayFehler>;

/// Alle moeglichen Fehler im Mouthpiece-Gateway
#[derive(Debug, Error)]
pub enum GatewayFehler {
    // --- Verbindung & Transport ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Zulassung & Limits ---
    #[error("Server voll: maximale Verbindungsanzahl erreicht")]
    ServerVoll,

    #[error("Rate-Limit ueberschritten")]
    RateLimit,

    #[error("Text zu lang: {laenge} Zeichen (Maximum: {maximum})")]
    TextZuLang { laenge: usize, maximum: usize },

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Synthese ---
    #[error("Synthese fehlgeschlagen: {0}")]
    Synthese(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl GatewayFehler {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler die Sitzung beendet.
    ///
    /// Nur Transportfehler sind fatal fuer eine Sitzung; alle anderen
    /// Fehler werden dem Client gemeldet und die Verbindung bleibt offen.
    pub fn ist_fatal_fuer_sitzung(&self) -> bool {
        matches!(self, Self::Verbindung(_) | Self::Getrennt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = GatewayFehler::TextZuLang {
            laenge: 5001,
            maximum: 5000,
        };
        assert!(e.to_string().contains("5001"));
        assert!(e.to_string().contains("5000"));
    }

    #[test]
    fn fatal_erkennung() {
        assert!(GatewayFehler::Getrennt("test".into()).ist_fatal_fuer_sitzung());
        assert!(!GatewayFehler::RateLimit.ist_fatal_fuer_sitzung());
        assert!(!GatewayFehler::Synthese("test".into()).ist_fatal_fuer_sitzung());
    }
}
