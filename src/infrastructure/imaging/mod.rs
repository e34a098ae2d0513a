mod image_thumbnailer;

pub use image_thumbnailer::{ImageThumbnailer, THUMBNAIL_SIZE};
