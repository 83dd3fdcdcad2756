//! Gemeinsamer Gateway-Kontext
//!
//! Buendelt die von allen Sitzungs-Tasks geteilten Strukturen. Clone ist
//! billig: alle Felder teilen ihren inneren Zustand.

use std::sync::Arc;

use mouthpiece_synthese::{StimmenKatalog, SyntheseEngine};

use crate::rate_limit::RateLimiter;
use crate::registry::Verbindungsregister;

/// Geteilter Zustand aller Sitzungs-Tasks
#[derive(Clone)]
pub struct GatewayKontext {
    /// Register aller aktiven Sitzungen (Zulassungskontrolle)
    pub register: Verbindungsregister,
    /// Sliding-Window-Rate-Limiter pro Client-Schluessel
    pub limiter: Arc<RateLimiter>,
    /// Externer Synthese-Kollaborateur
    pub engine: Arc<dyn SyntheseEngine>,
    /// Katalog erlaubter Stimmen
    pub katalog: Arc<StimmenKatalog>,
    /// Maximale Textlaenge einer Synthese-Anfrage in Zeichen
    pub max_text_laenge: usize,
}
