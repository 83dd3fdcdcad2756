//! Nachrichten-Transport – Naht zwischen Sitzung und Socket
//!
//! Der [`SitzungsHandler`](crate::session::SitzungsHandler) spricht mit
//! dem Client ausschliesslich ueber diese Schnittstelle. Produktiv steht
//! dahinter ein `WebSocketStream`; Tests ersetzen ihn durch einen
//! Nachrichtenpuffer.

use mouthpiece_core::{GatewayFehler, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsFehler, Message};
use tokio_tungstenite::WebSocketStream;

use futures_util::{SinkExt, StreamExt};

/// Diskreter Nachrichtentransport mit Abschlusserkennung
#[async_trait::async_trait]
pub trait NachrichtenTransport: Send {
    /// Wartet auf die naechste eingehende Nachricht.
    ///
    /// `None` bedeutet: die Gegenseite hat die Verbindung geschlossen.
    async fn empfangen(&mut self) -> Option<Result<Message>>;

    /// Sendet eine Nachricht und wartet auf den Abschluss des Schreibens
    async fn senden(&mut self, nachricht: Message) -> Result<()>;

    /// Schliesst die Verbindung, optional mit Code und Grund
    async fn schliessen(&mut self, grund: Option<CloseFrame>) -> Result<()>;
}

#[async_trait::async_trait]
impl<S> NachrichtenTransport for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn empfangen(&mut self) -> Option<Result<Message>> {
        self.next()
            .await
            .map(|ergebnis| ergebnis.map_err(|e| GatewayFehler::Getrennt(e.to_string())))
    }

    async fn senden(&mut self, nachricht: Message) -> Result<()> {
        SinkExt::send(self, nachricht)
            .await
            .map_err(|e| GatewayFehler::Verbindung(e.to_string()))
    }

    async fn schliessen(&mut self, grund: Option<CloseFrame>) -> Result<()> {
        match self.close(grund).await {
            Ok(()) | Err(WsFehler::ConnectionClosed) | Err(WsFehler::AlreadyClosed) => Ok(()),
            Err(e) => Err(GatewayFehler::Verbindung(e.to_string())),
        }
    }
}
