//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass das Gateway ohne Konfigurationsdatei
//! lauffaehig ist.

use mouthpiece_core::{GatewayFehler, Result};
use mouthpiece_synthese::stimmen::{standard_katalog, STANDARD_STIMME};
use mouthpiece_synthese::StimmenKatalog;
use serde::{Deserialize, Serialize};

/// Umgebungsvariable zum Uebersteuern der Standardstimme
pub const STIMMEN_UMGEBUNGSVARIABLE: &str = "MOUTHPIECE_STIMME";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Grenzen: Laengen, Verbindungen, Rate-Limit, Drain
    pub grenzen: GrenzenEinstellungen,
    /// Stimmen-Einstellungen
    pub stimmen: StimmenEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Host des WebSocket-Endpunkts
    pub host: String,
    /// Port des WebSocket-Endpunkts
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8765,
        }
    }
}

/// Grenzen fuer Zulassung und Missbrauchs-Abwehr
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenzenEinstellungen {
    /// Maximale Textlaenge einer Synthese-Anfrage in Zeichen
    pub max_text_laenge: usize,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
    /// Laenge des Rate-Limit-Fensters in Sekunden
    pub rate_fenster_sekunden: u64,
    /// Maximale Anfragen pro Client-Schluessel innerhalb des Fensters
    pub rate_max_anfragen: usize,
    /// Frist fuer das Leerlaufen der Sitzungen beim Herunterfahren
    pub drain_frist_sekunden: u64,
}

impl Default for GrenzenEinstellungen {
    fn default() -> Self {
        Self {
            max_text_laenge: 5000,
            max_verbindungen: 5,
            rate_fenster_sekunden: 60,
            rate_max_anfragen: 20,
            drain_frist_sekunden: 5,
        }
    }
}

/// Stimmen-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StimmenEinstellungen {
    /// Standardstimme fuer Anfragen ohne (oder mit unbekannter) Stimme
    pub standard: String,
    /// Erlaubt-Liste der Stimmen
    pub erlaubt: Vec<String>,
}

impl Default for StimmenEinstellungen {
    fn default() -> Self {
        Self {
            standard: STANDARD_STIMME.into(),
            erlaubt: standard_katalog(),
        }
    }
}

impl StimmenEinstellungen {
    /// Baut den Stimmen-Katalog aus den Einstellungen
    pub fn katalog(&self) -> StimmenKatalog {
        StimmenKatalog::neu(self.standard.clone(), self.erlaubt.clone())
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht
    /// existiert. Die Standardstimme laesst sich zusaetzlich ueber die
    /// Umgebungsvariable `MOUTHPIECE_STIMME` uebersteuern.
    pub fn laden(pfad: &str) -> Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt).map_err(|e| {
                GatewayFehler::Konfiguration(format!("Konfigurationsfehler in '{pfad}': {e}"))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(GatewayFehler::Konfiguration(format!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                )))
            }
        };

        if let Ok(stimme) = std::env::var(STIMMEN_UMGEBUNGSVARIABLE) {
            if !stimme.is_empty() {
                config.stimmen.standard = stimme;
            }
        }

        Ok(config)
    }

    /// Gibt die vollstaendige Bind-Adresse des Endpunkts zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.host, self.netzwerk.port)
    }
}
