//! Anfrage- und Antwortnachrichten
//!
//! ## Eingehend
//! - Steuerbefehl: `{"command": "health"}`
//! - Synthese-Anfrage: `{"text": "...", "voice": "..."?}`
//! - Fallback: eine rohe, nicht-leere Textnachricht wird wie
//!   `{"text": <nachricht>}` behandelt
//!
//! ## Ausgehend
//! - `{"status": "ok", "version": "...", "connections": N}`
//! - `{"error": "..."}`
//! - binaerer Audio-Chunk (opake Bytes, ein Chunk pro Nachricht)
//! - binaere Ende-Marke `END` als Abschluss jeder Synthese-Antwortfolge

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;

/// Binaere Ende-Marke: schliesst jede Synthese-Antwortfolge ab
pub const ENDE_MARKE: &[u8] = b"END";

/// Befehlswert fuer den Gesundheits-Check
pub const GESUNDHEIT_BEFEHL: &str = "health";

// ---------------------------------------------------------------------------
// Eingehende Nachrichten
// ---------------------------------------------------------------------------

/// Rohform einer strukturierten Anfrage (alle Felder optional, damit der
/// Fallback-Pfad greifen kann statt hart abzulehnen)
#[derive(Debug, Deserialize)]
struct RohAnfrage {
    command: Option<String>,
    text: Option<String>,
    voice: Option<String>,
}

/// Eine dekodierte Client-Anfrage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anfrage {
    /// Gesundheits-Check – umgeht Laengen- und Stimmenvalidierung
    Gesundheit,
    /// Synthese-Anfrage mit Text und optionalem Stimmen-Wunsch
    Synthese {
        text: String,
        stimme: Option<String>,
    },
}

/// Fehler beim Dekodieren einer eingehenden Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnfrageFehler {
    /// Payload ist kein Text (z. B. eine binaere Nachricht)
    #[error("Nachricht ist kein Text")]
    KeinText,
    /// Textnachricht ist nach dem Trimmen leer
    #[error("Leere Nachricht")]
    Leer,
}

impl Anfrage {
    /// Dekodiert eine rohe Textnachricht.
    ///
    /// Strukturierte JSON-Anfragen haben Vorrang; alles was nicht als
    /// solche lesbar ist faellt auf den Klartext-Pfad zurueck (getrimmt,
    /// Standardstimme). Nur eine leere Nachricht ist ein Fehler.
    pub fn aus_text(roh: &str) -> Result<Self, AnfrageFehler> {
        if let Ok(strukturiert) = serde_json::from_str::<RohAnfrage>(roh) {
            if strukturiert.command.as_deref() == Some(GESUNDHEIT_BEFEHL) {
                return Ok(Self::Gesundheit);
            }
            if let Some(text) = strukturiert.text {
                return Ok(Self::Synthese {
                    text,
                    stimme: strukturiert.voice,
                });
            }
        }

        let getrimmt = roh.trim();
        if getrimmt.is_empty() {
            return Err(AnfrageFehler::Leer);
        }
        Ok(Self::Synthese {
            text: getrimmt.to_string(),
            stimme: None,
        })
    }

    /// Dekodiert eine eingehende WebSocket-Nachricht
    pub fn aus_nachricht(nachricht: &Message) -> Result<Self, AnfrageFehler> {
        match nachricht {
            Message::Text(text) => Self::aus_text(text.as_str()),
            _ => Err(AnfrageFehler::KeinText),
        }
    }
}

// ---------------------------------------------------------------------------
// Ausgehende Nachrichten
// ---------------------------------------------------------------------------

/// Eine ausgehende Nachricht an den Client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Antwort {
    /// Fehlermeldung, beendet die Verbindung nicht
    Fehler(String),
    /// Antwort auf den Gesundheits-Check
    Status {
        version: String,
        verbindungen: usize,
    },
    /// Ein Audio-Chunk (opake Bytes)
    AudioChunk(Bytes),
    /// Ende-Marke einer Synthese-Antwortfolge
    EndeMarke,
}

#[derive(Serialize)]
struct StatusNachricht<'a> {
    status: &'a str,
    version: &'a str,
    connections: usize,
}

#[derive(Serialize)]
struct FehlerNachricht<'a> {
    error: &'a str,
}

impl Antwort {
    /// Kodiert die Antwort als WebSocket-Nachricht
    pub fn als_nachricht(&self) -> Message {
        match self {
            Antwort::Fehler(meldung) => json_nachricht(&FehlerNachricht { error: meldung }),
            Antwort::Status {
                version,
                verbindungen,
            } => json_nachricht(&StatusNachricht {
                status: "ok",
                version,
                connections: *verbindungen,
            }),
            Antwort::AudioChunk(bytes) => Message::Binary(bytes.clone()),
            Antwort::EndeMarke => Message::Binary(Bytes::from_static(ENDE_MARKE)),
        }
    }
}

/// Serialisiert einen Wert als JSON-Textnachricht
fn json_nachricht<T: Serialize>(wert: &T) -> Message {
    match serde_json::to_string(wert) {
        Ok(json) => Message::Text(json.into()),
        // Serialisierung der obigen Structs kann praktisch nicht
        // fehlschlagen; zur Sicherheit eine feste Fehlernachricht
        Err(_) => Message::Text(r#"{"error":"internal error"}"#.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
