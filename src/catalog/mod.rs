// 商品目录服务模块

pub mod client;
pub mod types;

pub use client::{CatalogClient, CatalogError};
pub use types::{CameraView, Model3d, PartInfo, ProductSnapshot, SceneMaterial, ScenePart};
