//! # Frame Checks
//!
//! Validators that run over a batch of loaded frames, after or beside the
//! structural and profile passes:
//!
//! - [`check_markup`]: `text.format` values and InlineMarkup-K1 text fields
//! - [`check_pub_tex`]: PubTeX attributes and the TeX control-sequence policy
//! - [`check_references`]: FrameURL references across the batch
//!
//! Every check returns `(violations, warnings)`. Frames are visited in the
//! order given, nodes and edges in input order.

mod markup;
mod pubtex;
mod references;

pub use markup::check_markup;
pub use pubtex::check_pub_tex;
pub use references::{check_references, is_frame_url};
