use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::api::CommentaryGenerator;

/// Board text before any match starts
pub const READY_TEXT: &str = "Match ready to start!";

/// Board text when a match starts
pub const MATCH_START_TEXT: &str = "The match is about to begin!";

/// Commentary wanted for one delivery
#[derive(Debug, Clone)]
pub struct CommentaryRequest {
    /// Board sequence this request was issued under
    pub seq: u64,
    pub event: String,
    pub batter: String,
    pub bowler: String,
    pub score: String,
}

/// Display-only commentary line. Responses for superseded requests are dropped.
#[derive(Debug, Clone)]
pub struct CommentaryBoard {
    current_seq: u64,
    text: String,
}

pub type SharedBoard = Arc<RwLock<CommentaryBoard>>;

impl CommentaryBoard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            current_seq: 0,
            text: text.into(),
        }
    }

    /// Start a new request; earlier outstanding requests become stale
    pub fn issue(&mut self) -> u64 {
        self.current_seq += 1;
        self.current_seq
    }

    /// Replace the text directly, invalidating outstanding requests
    pub fn announce(&mut self, text: impl Into<String>) {
        self.current_seq += 1;
        self.text = text.into();
    }

    /// Apply a response if it belongs to the current request
    pub fn resolve(&mut self, seq: u64, text: String) -> bool {
        if seq != self.current_seq {
            return false;
        }
        self.text = text;
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn current_seq(&self) -> u64 {
        self.current_seq
    }
}

impl Default for CommentaryBoard {
    fn default() -> Self {
        Self::new(READY_TEXT)
    }
}

/// Sending half used by the scoring session
#[derive(Clone)]
pub struct CommentaryDispatcher {
    tx: mpsc::Sender<CommentaryRequest>,
    board: SharedBoard,
}

/// Worker that turns requests into board updates
pub struct CommentaryWorker {
    generator: Arc<CommentaryGenerator>,
    board: SharedBoard,
    request_rx: mpsc::Receiver<CommentaryRequest>,
}

/// Create a connected dispatcher and worker
pub fn commentary_channel(
    generator: CommentaryGenerator,
    capacity: usize,
) -> (CommentaryDispatcher, CommentaryWorker) {
    let (tx, rx) = mpsc::channel(capacity);
    let board: SharedBoard = Arc::new(RwLock::new(CommentaryBoard::default()));

    let dispatcher = CommentaryDispatcher {
        tx,
        board: Arc::clone(&board),
    };
    let worker = CommentaryWorker {
        generator: Arc::new(generator),
        board,
        request_rx: rx,
    };
    (dispatcher, worker)
}

impl CommentaryDispatcher {
    /// Queue a request without waiting; a full queue drops it
    pub async fn dispatch(&self, event: String, batter: String, bowler: String, score: String) {
        let seq = self.board.write().await.issue();

        let request = CommentaryRequest {
            seq,
            event,
            batter,
            bowler,
            score,
        };

        if let Err(e) = self.tx.try_send(request) {
            warn!("Dropping commentary request {}: {}", seq, e);
        }
    }

    /// Set the board text directly
    pub async fn announce(&self, text: &str) {
        self.board.write().await.announce(text);
    }

    /// Latest resolved commentary line
    pub async fn current_text(&self) -> String {
        self.board.read().await.text().to_string()
    }

    pub fn board(&self) -> SharedBoard {
        Arc::clone(&self.board)
    }
}

impl CommentaryWorker {
    /// Run the worker loop until every dispatcher is dropped
    pub async fn run(mut self) {
        info!(
            "Commentary worker started (configured: {})",
            self.generator.is_configured()
        );

        while let Some(request) = self.request_rx.recv().await {
            let generator = Arc::clone(&self.generator);
            let board = Arc::clone(&self.board);

            // One task per request so a slow call never holds up the next one
            tokio::spawn(async move {
                let text = generator
                    .generate(
                        &request.event,
                        &request.batter,
                        &request.bowler,
                        &request.score,
                    )
                    .await;

                if !board.write().await.resolve(request.seq, text) {
                    debug!("Discarded stale commentary for request {}", request.seq);
                }
            });
        }

        info!("Commentary channel closed");
    }
}
