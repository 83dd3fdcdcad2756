//! mouthpiece-gateway – Kern des Streaming-Gateways
//!
//! Verwaltet den Lebenszyklus vieler gleichzeitiger Client-Sitzungen:
//! Zulassungskontrolle ueber das [`Verbindungsregister`], Missbrauchs-
//! Abwehr ueber den [`RateLimiter`], das Anfrage/Antwort-Protokoll pro
//! Sitzung im [`SitzungsHandler`] und das koordinierte Herunterfahren
//! im [`AbschaltKoordinator`].

pub mod kontext;
pub mod rate_limit;
pub mod registry;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod transport;

pub use kontext::GatewayKontext;
pub use rate_limit::RateLimiter;
pub use registry::{SessionGriff, Verbindungsregister};
pub use server::GatewayServer;
pub use session::{SitzungsHandler, SitzungsZustand};
pub use shutdown::AbschaltKoordinator;
pub use transport::NachrichtenTransport;
