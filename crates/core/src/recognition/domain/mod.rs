pub mod identity_gallery;
