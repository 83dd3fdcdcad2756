//! Sitzungs-Handler – Verwaltet eine einzelne Client-Verbindung
//!
//! Jede zugelassene Verbindung bekommt einen `SitzungsHandler` in einem
//! eigenen tokio-Task. Die Anfragen einer Sitzung werden strikt
//! sequenziell abgefertigt: die naechste eingehende Nachricht wird erst
//! gelesen, wenn die komplette Antwortfolge der aktuellen Anfrage
//! (einschliesslich Ende-Marke) gesendet ist.
//!
//! ## State Machine
//! ```text
//! Angenommen -> Aktiv -> Abfertigend -> Aktiv -> ... -> Schliessend -> Geschlossen
//! ```
//!
//! ## Abbau
//! Ob die Gegenseite trennt, der Transport ausfaellt oder der Shutdown-
//! Broadcast eintrifft: Abmeldung beim Register und Vergessen des
//! Rate-Limit-Eintrags laufen genau einmal, an einer einzigen Stelle
//! nach der Schleife.

use std::time::Instant;

use futures_util::StreamExt;
use mouthpiece_core::{GatewayFehler, Result, SessionId};
use mouthpiece_protocol::{schliessgrund_herunterfahren, Anfrage, Antwort};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::kontext::GatewayKontext;
use crate::transport::NachrichtenTransport;

/// Maximale Textlaenge im Anfrage-Log
const LOG_TEXT_KUERZUNG: usize = 80;

// ---------------------------------------------------------------------------
// Sitzungszustand
// ---------------------------------------------------------------------------

/// Zustand einer Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitzungsZustand {
    /// Zugelassen, Schleife noch nicht gestartet
    Angenommen,
    /// Wartet auf die naechste Anfrage
    Aktiv,
    /// Fertigt eine Anfrage ab
    Abfertigend,
    /// Verbindung wird abgebaut
    Schliessend,
    /// Endzustand
    Geschlossen,
}

/// Schleifensteuerung nach einer behandelten Nachricht
enum Ausgang {
    Weiter,
    Beenden,
}

// ---------------------------------------------------------------------------
// SitzungsHandler
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne zugelassene Verbindung
pub struct SitzungsHandler {
    id: SessionId,
    client_schluessel: String,
    kontext: GatewayKontext,
    zustand: SitzungsZustand,
}

impl SitzungsHandler {
    /// Erstellt einen Handler fuer eine bereits zugelassene Sitzung
    pub fn neu(id: SessionId, client_schluessel: impl Into<String>, kontext: GatewayKontext) -> Self {
        Self {
            id,
            client_schluessel: client_schluessel.into(),
            kontext,
            zustand: SitzungsZustand::Angenommen,
        }
    }

    /// Gibt den aktuellen Sitzungszustand zurueck
    pub fn zustand(&self) -> SitzungsZustand {
        self.zustand
    }

    /// Startet die Verarbeitungsschleife.
    ///
    /// Laeuft bis die Gegenseite trennt, der Transport ausfaellt oder
    /// das Schliess-Signal des Shutdown-Broadcasts eintrifft.
    pub async fn verarbeiten<T>(mut self, transport: &mut T, mut schliess_rx: mpsc::Receiver<()>)
    where
        T: NachrichtenTransport,
    {
        self.zustand = SitzungsZustand::Aktiv;

        loop {
            tokio::select! {
                eingang = transport.empfangen() => match eingang {
                    Some(Ok(nachricht)) => {
                        match self.nachricht_behandeln(transport, nachricht).await {
                            Ok(Ausgang::Weiter) => {}
                            Ok(Ausgang::Beenden) => {
                                tracing::info!(
                                    client = %self.client_schluessel,
                                    "Verbindung vom Client getrennt"
                                );
                                break;
                            }
                            Err(fehler) => {
                                tracing::warn!(
                                    client = %self.client_schluessel,
                                    fehler = %fehler,
                                    "Senden fehlgeschlagen"
                                );
                                break;
                            }
                        }
                    }
                    Some(Err(fehler)) => {
                        tracing::warn!(
                            client = %self.client_schluessel,
                            fehler = %fehler,
                            "Lesefehler auf der Verbindung"
                        );
                        break;
                    }
                    None => {
                        tracing::info!(
                            client = %self.client_schluessel,
                            "Verbindung vom Client getrennt"
                        );
                        break;
                    }
                },

                // Shutdown-Broadcast: Schliessen anfordern und beenden
                Some(()) = schliess_rx.recv() => {
                    tracing::info!(
                        client = %self.client_schluessel,
                        "Server faehrt herunter, Sitzung wird geschlossen"
                    );
                    self.zustand = SitzungsZustand::Schliessend;
                    let _ = transport.schliessen(Some(schliessgrund_herunterfahren())).await;
                    break;
                }
            }
        }

        // Abbau – genau einmal, egal wie die Schleife endete
        self.zustand = SitzungsZustand::Schliessend;
        self.kontext.register.abmelden(&self.id);
        self.kontext.limiter.vergessen(&self.client_schluessel);
        self.zustand = SitzungsZustand::Geschlossen;
        tracing::info!(
            client = %self.client_schluessel,
            aktiv = self.kontext.register.anzahl(),
            "Client entfernt"
        );
    }

    /// Behandelt eine einzelne eingehende Nachricht.
    ///
    /// `Err` bedeutet Transportausfall (fatal fuer die Sitzung); alle
    /// Anfrage-Fehler werden dem Client gemeldet und beenden die
    /// Verbindung nicht.
    async fn nachricht_behandeln<T>(
        &mut self,
        transport: &mut T,
        nachricht: Message,
    ) -> Result<Ausgang>
    where
        T: NachrichtenTransport,
    {
        match &nachricht {
            Message::Close(_) => return Ok(Ausgang::Beenden),
            // Ping/Pong beantwortet die WebSocket-Schicht selbst
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Ok(Ausgang::Weiter),
            _ => {}
        }

        // 1. Rate-Gate: Ablehnung verwirft nur diese Anfrage
        if !self
            .kontext
            .limiter
            .erlauben(&self.client_schluessel, Instant::now())
        {
            tracing::warn!(client = %self.client_schluessel, "Rate-Limit ueberschritten");
            self.fehler_melden(transport, &GatewayFehler::RateLimit).await?;
            return Ok(Ausgang::Weiter);
        }

        // 2./3. Dekodieren inkl. Klartext-Fallback
        let anfrage = match Anfrage::aus_nachricht(&nachricht) {
            Ok(anfrage) => anfrage,
            Err(fehler) => {
                tracing::warn!(
                    client = %self.client_schluessel,
                    fehler = %fehler,
                    "Unverstaendliche Anfrage"
                );
                self.fehler_melden(
                    transport,
                    &GatewayFehler::UngueltigeNachricht(fehler.to_string()),
                )
                .await?;
                return Ok(Ausgang::Weiter);
            }
        };

        match anfrage {
            Anfrage::Gesundheit => {
                let antwort = Antwort::Status {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    verbindungen: self.kontext.register.anzahl(),
                };
                self.senden(transport, antwort).await?;
                Ok(Ausgang::Weiter)
            }
            Anfrage::Synthese { text, stimme } => {
                self.synthese_abfertigen(transport, text, stimme).await
            }
        }
    }

    /// Fertigt eine Synthese-Anfrage ab: Validierung, Streaming der
    /// Chunks, abschliessende Ende-Marke.
    async fn synthese_abfertigen<T>(
        &mut self,
        transport: &mut T,
        text: String,
        stimme: Option<String>,
    ) -> Result<Ausgang>
    where
        T: NachrichtenTransport,
    {
        self.zustand = SitzungsZustand::Abfertigend;

        // 4. Laengenvalidierung – vor jedem Synthese-Versuch
        let laenge = text.chars().count();
        if laenge > self.kontext.max_text_laenge {
            tracing::warn!(
                client = %self.client_schluessel,
                laenge,
                maximum = self.kontext.max_text_laenge,
                "Text zu lang"
            );
            self.fehler_melden(
                transport,
                &GatewayFehler::TextZuLang {
                    laenge,
                    maximum: self.kontext.max_text_laenge,
                },
            )
            .await?;
            self.zustand = SitzungsZustand::Aktiv;
            return Ok(Ausgang::Weiter);
        }

        // 5. Stimmen-Aufloesung – nie ein Fehler
        let stimme = self.kontext.katalog.aufloesen(stimme.as_deref()).to_string();

        tracing::info!(
            client = %self.client_schluessel,
            stimme = %stimme,
            text = %kurzfassung(&text),
            "Synthese-Anfrage"
        );

        // 6. An die Engine weiterreichen und Chunks durchstreamen
        match self.kontext.engine.synthetisieren(&text, &stimme).await {
            Ok(mut strom) => {
                let mut chunk_anzahl = 0usize;
                let mut fehlgeschlagen = false;
                while let Some(chunk) = strom.next().await {
                    match chunk {
                        Ok(bytes) => {
                            self.senden(transport, Antwort::AudioChunk(bytes)).await?;
                            chunk_anzahl += 1;
                        }
                        Err(fehler) => {
                            tracing::warn!(
                                client = %self.client_schluessel,
                                fehler = %fehler,
                                "Synthese mitten im Strom fehlgeschlagen"
                            );
                            self.fehler_melden(
                                transport,
                                &GatewayFehler::Synthese(fehler.to_string()),
                            )
                            .await?;
                            fehlgeschlagen = true;
                            break;
                        }
                    }
                }
                // Genau eine Ende-Marke, auch nach einem Fehlschlag
                self.senden(transport, Antwort::EndeMarke).await?;
                if !fehlgeschlagen {
                    tracing::info!(
                        client = %self.client_schluessel,
                        chunks = chunk_anzahl,
                        "Synthese abgeschlossen"
                    );
                }
            }
            Err(fehler) => {
                tracing::warn!(
                    client = %self.client_schluessel,
                    fehler = %fehler,
                    "Synthese fehlgeschlagen"
                );
                self.fehler_melden(transport, &GatewayFehler::Synthese(fehler.to_string()))
                    .await?;
                self.senden(transport, Antwort::EndeMarke).await?;
            }
        }

        self.zustand = SitzungsZustand::Aktiv;
        Ok(Ausgang::Weiter)
    }

    /// Meldet einen nicht-fatalen Fehler an den Client
    async fn fehler_melden<T>(&mut self, transport: &mut T, fehler: &GatewayFehler) -> Result<()>
    where
        T: NachrichtenTransport,
    {
        let antwort = Antwort::Fehler(client_meldung(fehler));
        self.senden(transport, antwort).await
    }

    async fn senden<T>(&mut self, transport: &mut T, antwort: Antwort) -> Result<()>
    where
        T: NachrichtenTransport,
    {
        transport.senden(antwort.als_nachricht()).await
    }
}

/// Uebersetzt einen Gateway-Fehler in die englische Drahtmeldung.
///
/// Die Meldungen auf dem Draht sind Teil des Client-Protokolls und
/// bleiben stabil, unabhaengig von der `Display`-Darstellung der Fehler.
fn client_meldung(fehler: &GatewayFehler) -> String {
    match fehler {
        GatewayFehler::RateLimit => "Rate limit exceeded. Try again later.".to_string(),
        GatewayFehler::TextZuLang { maximum, .. } => {
            format!("Text exceeds maximum length of {maximum} characters")
        }
        GatewayFehler::UngueltigeNachricht(_) => {
            "Send JSON with 'text' field or a plain text string".to_string()
        }
        GatewayFehler::Synthese(grund) => format!("TTS failed: {grund}"),
        andere => andere.to_string(),
    }
}

/// Kuerzt einen Text fuer das Log auf eine feste Zeichenzahl
fn kurzfassung(text: &str) -> String {
    text.chars().take(LOG_TEXT_KUERZUNG).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::stream;
    use mouthpiece_protocol::ENDE_MARKE;
    use mouthpiece_synthese::{AudioStrom, StimmenKatalog, SyntheseEngine, SyntheseFehler};
    use parking_lot::Mutex;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    use crate::rate_limit::RateLimiter;
    use crate::registry::{SessionGriff, Verbindungsregister};

    // -- Test-Transport -----------------------------------------------------

    /// Nachrichtenpuffer statt Socket
    struct TestTransport {
        eingehend: VecDeque<Message>,
        gesendet: Vec<Message>,
        geschlossen_mit: Option<Option<CloseFrame>>,
        /// true: nach leerem Puffer ewig warten statt Verbindungsende melden
        blockiert_nach_ende: bool,
    }

    impl TestTransport {
        fn mit_nachrichten(nachrichten: Vec<Message>) -> Self {
            Self {
                eingehend: nachrichten.into(),
                gesendet: Vec::new(),
                geschlossen_mit: None,
                blockiert_nach_ende: false,
            }
        }

        fn blockierend() -> Self {
            Self {
                eingehend: VecDeque::new(),
                gesendet: Vec::new(),
                geschlossen_mit: None,
                blockiert_nach_ende: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl NachrichtenTransport for TestTransport {
        async fn empfangen(&mut self) -> Option<Result<Message>> {
            match self.eingehend.pop_front() {
                Some(nachricht) => Some(Ok(nachricht)),
                None if self.blockiert_nach_ende => futures_util::future::pending().await,
                None => None,
            }
        }

        async fn senden(&mut self, nachricht: Message) -> Result<()> {
            self.gesendet.push(nachricht);
            Ok(())
        }

        async fn schliessen(&mut self, grund: Option<CloseFrame>) -> Result<()> {
            self.geschlossen_mit = Some(grund);
            Ok(())
        }
    }

    // -- Test-Engines -------------------------------------------------------

    /// Liefert feste Chunks und zeichnet die verwendete Stimme auf
    struct TestEngine {
        chunks: Vec<Bytes>,
        verwendete_stimme: Arc<Mutex<Option<String>>>,
    }

    impl TestEngine {
        fn mit_chunks(chunks: Vec<Bytes>) -> Self {
            Self {
                chunks,
                verwendete_stimme: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait::async_trait]
    impl SyntheseEngine for TestEngine {
        async fn synthetisieren(
            &self,
            _text: &str,
            stimme: &str,
        ) -> std::result::Result<AudioStrom, SyntheseFehler> {
            *self.verwendete_stimme.lock() = Some(stimme.to_string());
            let chunks: Vec<std::result::Result<Bytes, SyntheseFehler>> =
                self.chunks.iter().cloned().map(Ok).collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    /// Liefert erst Chunks, dann einen Fehler mitten im Strom
    struct DefekteEngine {
        chunks_vor_fehler: usize,
    }

    #[async_trait::async_trait]
    impl SyntheseEngine for DefekteEngine {
        async fn synthetisieren(
            &self,
            _text: &str,
            _stimme: &str,
        ) -> std::result::Result<AudioStrom, SyntheseFehler> {
            let mut elemente: Vec<std::result::Result<Bytes, SyntheseFehler>> = (0
                ..self.chunks_vor_fehler)
                .map(|i| Ok(Bytes::from(format!("chunk-{i}").into_bytes())))
                .collect();
            elemente.push(Err(SyntheseFehler::Abgebrochen("stromabriss".into())));
            Ok(Box::pin(stream::iter(elemente)))
        }
    }

    /// Schlaegt vor dem ersten Chunk fehl
    struct KaputteEngine;

    #[async_trait::async_trait]
    impl SyntheseEngine for KaputteEngine {
        async fn synthetisieren(
            &self,
            _text: &str,
            _stimme: &str,
        ) -> std::result::Result<AudioStrom, SyntheseFehler> {
            Err(SyntheseFehler::NichtErreichbar("engine offline".into()))
        }
    }

    // -- Hilfen -------------------------------------------------------------

    fn kontext_mit(engine: Arc<dyn SyntheseEngine>, max_text_laenge: usize) -> GatewayKontext {
        GatewayKontext {
            register: Verbindungsregister::neu(5),
            limiter: Arc::new(RateLimiter::neu(Duration::from_secs(60), 20)),
            engine,
            katalog: Arc::new(StimmenKatalog::default()),
            max_text_laenge,
        }
    }

    /// Meldet eine Sitzung an und laesst den Handler den Transport
    /// vollstaendig abarbeiten
    async fn durchlaufen(kontext: GatewayKontext, transport: &mut TestTransport) {
        let (griff, schliess_rx) = SessionGriff::neu("127.0.0.1:4000");
        let id = griff.id;
        assert!(kontext.register.anmelden(griff));
        let handler = SitzungsHandler::neu(id, "127.0.0.1:4000", kontext);
        handler.verarbeiten(transport, schliess_rx).await;
    }

    fn text_anfrage(json: &str) -> Message {
        Message::Text(json.to_string().into())
    }

    fn fehlertext(nachricht: &Message) -> Option<String> {
        let Message::Text(text) = nachricht else {
            return None;
        };
        let wert: serde_json::Value = serde_json::from_str(text.as_str()).ok()?;
        wert.get("error")?.as_str().map(String::from)
    }

    // -- Tests --------------------------------------------------------------

    #[tokio::test]
    async fn synthese_liefert_chunks_und_ende_marke() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![
            Bytes::from_static(b"aaa"),
            Bytes::from_static(b"bbb"),
        ]));
        let mut transport = TestTransport::mit_nachrichten(vec![text_anfrage(
            r#"{"text": "hello", "voice": "en-GB-RyanNeural"}"#,
        )]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        assert_eq!(
            transport.gesendet,
            vec![
                Message::Binary(Bytes::from_static(b"aaa")),
                Message::Binary(Bytes::from_static(b"bbb")),
                Message::Binary(Bytes::from_static(ENDE_MARKE)),
            ]
        );
    }

    #[tokio::test]
    async fn fehlschlag_mitten_im_strom_dann_fehler_dann_ende_marke() {
        let engine = Arc::new(DefekteEngine {
            chunks_vor_fehler: 2,
        });
        let mut transport =
            TestTransport::mit_nachrichten(vec![text_anfrage(r#"{"text": "hello"}"#)]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        assert_eq!(transport.gesendet.len(), 4);
        assert!(matches!(transport.gesendet[0], Message::Binary(_)));
        assert!(matches!(transport.gesendet[1], Message::Binary(_)));
        let fehler = fehlertext(&transport.gesendet[2]).expect("Fehlermeldung erwartet");
        assert!(fehler.starts_with("TTS failed:"), "war: {fehler}");
        assert_eq!(
            transport.gesendet[3],
            Message::Binary(Bytes::from_static(ENDE_MARKE))
        );
    }

    #[tokio::test]
    async fn fehlschlag_vor_erstem_chunk_sendet_fehler_und_ende_marke() {
        let engine = Arc::new(KaputteEngine);
        let mut transport =
            TestTransport::mit_nachrichten(vec![text_anfrage(r#"{"text": "hello"}"#)]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        assert_eq!(transport.gesendet.len(), 2);
        let fehler = fehlertext(&transport.gesendet[0]).expect("Fehlermeldung erwartet");
        assert!(fehler.starts_with("TTS failed:"));
        assert_eq!(
            transport.gesendet[1],
            Message::Binary(Bytes::from_static(ENDE_MARKE))
        );
    }

    #[tokio::test]
    async fn text_genau_am_maximum_wird_angenommen() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![Bytes::from_static(b"x")]));
        let text = "a".repeat(10);
        let mut transport = TestTransport::mit_nachrichten(vec![text_anfrage(&format!(
            r#"{{"text": "{text}"}}"#
        ))]);

        durchlaufen(kontext_mit(engine, 10), &mut transport).await;

        // Chunk + Ende-Marke, keine Fehlermeldung
        assert_eq!(transport.gesendet.len(), 2);
        assert!(fehlertext(&transport.gesendet[0]).is_none());
    }

    #[tokio::test]
    async fn zu_langer_text_wird_abgelehnt() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![Bytes::from_static(b"x")]));
        let text = "a".repeat(11);
        let mut transport = TestTransport::mit_nachrichten(vec![text_anfrage(&format!(
            r#"{{"text": "{text}"}}"#
        ))]);

        durchlaufen(kontext_mit(engine, 10), &mut transport).await;

        assert_eq!(transport.gesendet.len(), 1);
        let fehler = fehlertext(&transport.gesendet[0]).expect("Fehlermeldung erwartet");
        assert_eq!(fehler, "Text exceeds maximum length of 10 characters");
    }

    #[tokio::test]
    async fn unbekannte_stimme_wird_stillschweigend_ersetzt() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![Bytes::from_static(b"x")]));
        let stimmen_protokoll = engine.verwendete_stimme.clone();
        let mut transport = TestTransport::mit_nachrichten(vec![text_anfrage(
            r#"{"text": "hello", "voice": "xx-XX-GibtEsNicht"}"#,
        )]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        // Kein Fehler an den Client, Engine bekam die Standardstimme
        assert!(fehlertext(&transport.gesendet[0]).is_none());
        assert_eq!(
            stimmen_protokoll.lock().as_deref(),
            Some("en-GB-RyanNeural")
        );
    }

    #[tokio::test]
    async fn gesundheit_meldet_version_und_verbindungsanzahl() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![]));
        let mut transport =
            TestTransport::mit_nachrichten(vec![text_anfrage(r#"{"command": "health"}"#)]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        assert_eq!(transport.gesendet.len(), 1);
        let Message::Text(text) = &transport.gesendet[0] else {
            panic!("Status muss eine Textnachricht sein");
        };
        let wert: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(wert["status"], "ok");
        assert_eq!(wert["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(wert["connections"], 1);
    }

    #[tokio::test]
    async fn rate_limit_verwirft_nur_die_eine_anfrage() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![Bytes::from_static(b"x")]));
        let mut kontext = kontext_mit(engine, 5000);
        kontext.limiter = Arc::new(RateLimiter::neu(Duration::from_secs(60), 1));

        let mut transport = TestTransport::mit_nachrichten(vec![
            text_anfrage(r#"{"text": "erste"}"#),
            text_anfrage(r#"{"text": "zweite"}"#),
        ]);

        durchlaufen(kontext, &mut transport).await;

        // Erste Anfrage: Chunk + Ende-Marke; zweite: nur Fehlermeldung,
        // die Verbindung bleibt offen und die Schleife laeuft weiter
        assert_eq!(transport.gesendet.len(), 3);
        let fehler = fehlertext(&transport.gesendet[2]).expect("Fehlermeldung erwartet");
        assert_eq!(fehler, "Rate limit exceeded. Try again later.");
    }

    #[tokio::test]
    async fn unverstaendliche_anfrage_wird_gemeldet() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![]));
        let mut transport = TestTransport::mit_nachrichten(vec![
            Message::Binary(Bytes::from_static(b"\x00\x01\x02")),
            Message::Text("   ".to_string().into()),
        ]);

        durchlaufen(kontext_mit(engine, 5000), &mut transport).await;

        assert_eq!(transport.gesendet.len(), 2);
        for nachricht in &transport.gesendet {
            let fehler = fehlertext(nachricht).expect("Fehlermeldung erwartet");
            assert_eq!(fehler, "Send JSON with 'text' field or a plain text string");
        }
    }

    #[tokio::test]
    async fn abbau_entfernt_register_und_rate_limit_eintrag() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![Bytes::from_static(b"x")]));
        let kontext = kontext_mit(engine, 5000);
        let register = kontext.register.clone();
        let limiter = kontext.limiter.clone();

        let mut transport =
            TestTransport::mit_nachrichten(vec![text_anfrage(r#"{"text": "hello"}"#)]);
        durchlaufen(kontext, &mut transport).await;

        assert_eq!(register.anzahl(), 0);
        assert!(!limiter.kennt("127.0.0.1:4000"));
    }

    #[tokio::test]
    async fn schliess_signal_beendet_die_sitzung_mit_1001() {
        let engine = Arc::new(TestEngine::mit_chunks(vec![]));
        let kontext = kontext_mit(engine, 5000);
        let register = kontext.register.clone();

        let (griff, schliess_rx) = SessionGriff::neu("127.0.0.1:4000");
        let id = griff.id;
        assert!(register.anmelden(griff.clone()));

        // Signal liegt schon an bevor die Schleife startet; der Transport
        // liefert nie eine Nachricht
        griff.schliessen_anfordern();
        let mut transport = TestTransport::blockierend();
        let handler = SitzungsHandler::neu(id, "127.0.0.1:4000", kontext);
        handler.verarbeiten(&mut transport, schliess_rx).await;

        let grund = transport
            .geschlossen_mit
            .expect("Verbindung muss geschlossen worden sein")
            .expect("Schliessgrund erwartet");
        assert_eq!(u16::from(grund.code), 1001);
        assert_eq!(register.anzahl(), 0);
    }
}
