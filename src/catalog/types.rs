// 商品目录服务的数据类型
//
// 对应 GET /api/product/render/<id>/ 返回的 JSON 快照，
// 反序列化一次建立类型化结构，之后不再做动态键查找

use serde::{Deserialize, Serialize};

/// 商品渲染快照
///
/// 目录服务侧的只读数据：商品 → 3D模型 → 相机 → 部件 → 材质。
/// 本管线只读取它来决定哪些本地文件还需要上传，不会修改它
/// （成功上传后 image 字段的更新发生在服务端）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// 3D模型列表
    #[serde(rename = "model_3d", default)]
    pub models: Vec<Model3d>,
}

/// 单个3D模型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model3d {
    /// OBJ 模型文件地址（渲染阶段使用，上传阶段不关心）
    #[serde(default)]
    pub obj: Option<String>,
    /// 相机列表
    #[serde(default)]
    pub cameras: Vec<CameraView>,
}

/// 相机视角
///
/// 位置/欧拉角在目录服务侧是 Decimal，序列化成字符串传输
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraView {
    #[serde(default)]
    pub pos_x: Option<String>,
    #[serde(default)]
    pub pos_y: Option<String>,
    #[serde(default)]
    pub pos_z: Option<String>,
    #[serde(default)]
    pub rad_x: Option<String>,
    #[serde(default)]
    pub rad_y: Option<String>,
    #[serde(default)]
    pub rad_z: Option<String>,
    /// 该视角下的部件列表
    #[serde(default)]
    pub parts: Vec<ScenePart>,
}

/// 场景部件（某个相机视角下的一个可换材质部件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenePart {
    /// 部件基本信息
    pub part: PartInfo,
    /// 该部件的候选材质列表
    #[serde(default)]
    pub materials: Vec<SceneMaterial>,
}

/// 部件信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartInfo {
    /// 部件在 3D 场景中的名称，同时是渲染输出目录名
    pub blender_name: String,
}

/// 场景材质槽位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMaterial {
    /// 槽位ID（上传时作为 scene_material 字段提交）
    pub id: i64,
    /// 材质标识，渲染输出的文件名就是 `<material>.png`
    pub material: String,
    /// 已上传图片的地址；为 null 表示目录侧还没有图
    #[serde(default)]
    pub image: Option<String>,
}

impl SceneMaterial {
    /// 目录侧是否已有上传好的图片
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
