//! Image upload handling
//!
//! Everything between "the user picked a file" and "the bytes are ready to
//! ride along with the first turn":
//!
//! - `file`: the candidate upload and its declared MIME type
//! - `intake`: validation against type and size limits, staging
//! - `preview`: revocable local preview references
//! - `encoder`: base64 encoding of the staged bytes

pub mod encoder;
pub mod file;
pub mod intake;
pub mod preview;

pub use encoder::{decode, encode, encode_image, strip_data_uri_prefix};
pub use file::{mime_type_for_path, ImageFile, ImageSource};
pub use intake::{ImageIntake, ImageSummary, StagedImage};
pub use preview::{PreviewEntry, PreviewHandle, PreviewStore};
