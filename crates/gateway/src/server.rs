//! WebSocket-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `GatewayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task: WebSocket-Handshake,
//! Zulassungspruefung gegen das Register, dann die Sitzungsschleife.
//! Abgelehnte Verbindungen bekommen den Schliess-Code 1013 direkt nach
//! dem Handshake.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::accept_async;

use mouthpiece_protocol::schliessgrund_server_voll;

use crate::kontext::GatewayKontext;
use crate::registry::SessionGriff;
use crate::session::SitzungsHandler;
use crate::transport::NachrichtenTransport;

/// WebSocket-Gateway-Server
///
/// Bindet beim Erstellen, damit ein nicht bindbarer Endpunkt den
/// Prozessstart abbricht statt erst im Hintergrund-Task aufzufallen.
pub struct GatewayServer {
    listener: TcpListener,
    kontext: GatewayKontext,
}

impl GatewayServer {
    /// Bindet den TCP-Socket fuer den Gateway-Endpunkt
    pub async fn binden(adresse: &str, kontext: GatewayKontext) -> std::io::Result<Self> {
        let listener = TcpListener::bind(adresse).await?;
        Ok(Self { listener, kontext })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `stopp_rx` ein `true`-Signal liefert.
    ///
    /// Das Stopp-Signal beendet die Accept-Schleife sofort; laufende
    /// Sitzungen werden davon nicht beruehrt, die schliesst der
    /// Shutdown-Broadcast einzeln.
    pub async fn starten(self, mut stopp_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let adresse = self.listener.local_addr()?;
        tracing::info!(adresse = %adresse, "WebSocket-Gateway gestartet");

        loop {
            tokio::select! {
                ergebnis = self.listener.accept() => {
                    match ergebnis {
                        Ok((stream, peer_addr)) => {
                            let kontext = self.kontext.clone();
                            tokio::spawn(verbindung_behandeln(stream, peer_addr, kontext));
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                Ok(()) = stopp_rx.changed() => {
                    if *stopp_rx.borrow() {
                        tracing::info!("Gateway nimmt keine neuen Verbindungen mehr an");
                        break;
                    }
                }
            }
        }

        tracing::info!("WebSocket-Gateway gestoppt");
        Ok(())
    }
}

/// Behandelt eine frisch akzeptierte TCP-Verbindung
async fn verbindung_behandeln(stream: TcpStream, peer_addr: SocketAddr, kontext: GatewayKontext) {
    let mut websocket = match accept_async(stream).await {
        Ok(websocket) => websocket,
        Err(e) => {
            tracing::warn!(peer = %peer_addr, fehler = %e, "WebSocket-Handshake fehlgeschlagen");
            return;
        }
    };

    // Zulassung: Client-Schluessel ist die komplette Peer-Adresse
    let client_schluessel = peer_addr.to_string();
    let (griff, schliess_rx) = SessionGriff::neu(client_schluessel.clone());
    let id = griff.id;

    if !kontext.register.anmelden(griff) {
        tracing::warn!(
            peer = %peer_addr,
            max = kontext.register.max_verbindungen(),
            "Verbindung abgelehnt: Maximum erreicht"
        );
        let _ = websocket.schliessen(Some(schliessgrund_server_voll())).await;
        return;
    }

    tracing::info!(
        peer = %peer_addr,
        aktiv = kontext.register.anzahl(),
        "Client verbunden"
    );

    let handler = SitzungsHandler::neu(id, client_schluessel, kontext);
    handler.verarbeiten(&mut websocket, schliess_rx).await;
}
