use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing the whitespace key/value configuration format.
/// Every variant is fatal: the caller prints it and exits without rendering.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected key `{expected}` but found `{found}`")]
    UnexpectedKey { expected: String, found: String },

    #[error("expected key `{key}`, reached end of file")]
    UnexpectedEof { key: String },

    #[error("value for `{key}` is not a valid {kind}: `{value}`")]
    InvalidValue {
        key: String,
        kind: &'static str,
        value: String,
    },

    #[error("`{key}` must be >= 1, got {value}")]
    OutOfRange { key: String, value: i64 },
}

/// Errors raised while importing a triangle mesh from an OBJ file. Non-fatal
/// to the overall render: the config loader logs and contributes zero
/// triangles from the offending model.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("cannot load mesh {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("mesh {path} contains no triangles")]
    Empty { path: PathBuf },
}

/// Errors raised while decoding a texture or skybox face image. Non-fatal:
/// logged and the affected texture slot is left unset.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {path} has zero width or height")]
    Empty { path: PathBuf },
}
