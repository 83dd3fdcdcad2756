//! Echo-Engine – Platzhalter bis eine echte Synthese-Anbindung verlinkt ist
//!
//! Liefert die UTF-8-Bytes des Anfragetexts in festen Haeppchen als
//! "Audio"-Chunks zurueck. Damit laesst sich der komplette Protokollfluss
//! (Chunks, Ende-Marke, Fehlerpfade) ohne externe Engine durchspielen.

use bytes::Bytes;
use futures_util::stream;

use crate::{AudioStrom, SyntheseEngine, SyntheseFehler};

/// Chunk-Groesse der Echo-Engine in Bytes
const CHUNK_GROESSE: usize = 1024;

/// Entwicklungs-Engine ohne echte Sprachsynthese
#[derive(Debug, Default)]
pub struct EchoEngine;

#[async_trait::async_trait]
impl SyntheseEngine for EchoEngine {
    async fn synthetisieren(
        &self,
        text: &str,
        _stimme: &str,
    ) -> Result<AudioStrom, SyntheseFehler> {
        let chunks: Vec<Result<Bytes, SyntheseFehler>> = text
            .as_bytes()
            .chunks(CHUNK_GROESSE)
            .map(|stueck| Ok(Bytes::copy_from_slice(stueck)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}
