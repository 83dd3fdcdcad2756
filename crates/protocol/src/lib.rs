//! mouthpiece-protocol – Nachrichtenformate des WebSocket-Protokolls
//!
//! Jede WebSocket-Nachricht ist eine diskrete Protokolleinheit; ein
//! eigenes Framing ist nicht noetig. Eingehend: JSON-Objekte oder rohe
//! Textnachrichten. Ausgehend: JSON-Objekte (Status, Fehler), binaere
//! Audio-Chunks und die binaere Ende-Marke.

pub mod nachrichten;
pub mod schliessen;

pub use nachrichten::{Anfrage, AnfrageFehler, Antwort, ENDE_MARKE, GESUNDHEIT_BEFEHL};
pub use schliessen::{schliessgrund_herunterfahren, schliessgrund_server_voll};
