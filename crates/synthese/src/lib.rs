//! mouthpiece-synthese – Schnittstelle zur Sprachsynthese
//!
//! Das Gateway synthetisiert selbst keine Sprache. Dieses Crate definiert
//! die Grenze zum externen Synthese-Kollaborateur: gegeben Text und eine
//! Stimme liefert die Engine einen endlichen, lazy produzierten Strom von
//! Audio-Chunks – oder schlaegt fehl. Fehlschlaege koennen sowohl vor dem
//! ersten Chunk als auch mitten im Strom auftreten.

pub mod platzhalter;
pub mod stimmen;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

pub use platzhalter::EchoEngine;
pub use stimmen::StimmenKatalog;

/// Ein lazy produzierter, endlicher Strom von Audio-Chunks.
///
/// Jeder Chunk ist ein opakes Byte-Paket; das Gateway interpretiert den
/// Inhalt nicht. Ein `Err`-Element beendet den Strom.
pub type AudioStrom = BoxStream<'static, std::result::Result<Bytes, SyntheseFehler>>;

/// Fehler des Synthese-Kollaborateurs
#[derive(Debug, Error)]
pub enum SyntheseFehler {
    #[error("Engine nicht erreichbar: {0}")]
    NichtErreichbar(String),

    #[error("Synthese abgebrochen: {0}")]
    Abgebrochen(String),

    #[error("{0}")]
    Intern(String),
}

/// Schnittstelle zum externen Synthese-Kollaborateur
///
/// Implementierungen muessen `Send + Sync` sein, da dieselbe Engine von
/// beliebig vielen Sitzungs-Tasks gleichzeitig verwendet wird.
#[async_trait::async_trait]
pub trait SyntheseEngine: Send + Sync {
    /// Startet die Synthese fuer `text` mit der gegebenen Stimme.
    ///
    /// Die Stimme ist zu diesem Zeitpunkt bereits gegen den
    /// [`StimmenKatalog`] aufgeloest und garantiert gueltig.
    async fn synthetisieren(
        &self,
        text: &str,
        stimme: &str,
    ) -> std::result::Result<AudioStrom, SyntheseFehler>;
}
