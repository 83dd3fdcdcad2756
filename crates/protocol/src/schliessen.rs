//! Schliess-Codes des Gateways
//!
//! Zwei unterscheidbare Code/Grund-Paare: Zulassungs-Ablehnung bei
//! vollem Server (1013, "try again later") und erzwungenes Schliessen
//! beim Herunterfahren (1001, "going away"). Alles andere ist ein
//! normaler Verbindungsabschluss.

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

/// Zulassung abgelehnt: maximale Verbindungsanzahl erreicht (Code 1013)
pub fn schliessgrund_server_voll() -> CloseFrame {
    CloseFrame {
        code: CloseCode::Again,
        reason: "Maximum connections reached".into(),
    }
}

/// Erzwungenes Schliessen beim Herunterfahren (Code 1001)
pub fn schliessgrund_herunterfahren() -> CloseFrame {
    CloseFrame {
        code: CloseCode::Away,
        reason: "Server shutting down".into(),
    }
}
