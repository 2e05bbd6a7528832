pub mod commentary;

pub use commentary::{commentary_channel, CommentaryBoard, CommentaryDispatcher, CommentaryWorker};
