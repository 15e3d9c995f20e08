// 上传任务发现
//
// 遍历商品快照（模型 → 相机 → 部件 → 材质），对照本地渲染输出目录，
// 生成待上传任务集。遍历顺序就是渲染产出的顺序，不重新排序。
//
// 纳入条件（三者同时满足）：
// 1. part_filter 为空，或部件名在 filter 中
// 2. 期望路径上的渲染图在本地存在
// 3. 目录侧该材质槽位还没有图（image 为 null）
//
// 文件不存在或槽位已有图都是正常的过滤条件，不是错误。
// 除文件存在性检查外无任何副作用，同样的输入重复调用得到同样的任务集。

use crate::catalog::ProductSnapshot;
use crate::uploader::UploadTask;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 计算一张渲染图相对 media 根目录的期望路径
///
/// `variant_<id>/model_<n>/camera_<n>/<part_name>/<material_key>.png`，
/// 模型/相机序号都是 1-based 的遍历位置
pub fn expected_relative_path(
    variant_id: i64,
    model_index: usize,
    camera_index: usize,
    part_name: &str,
    material_key: &str,
) -> PathBuf {
    PathBuf::from(format!("variant_{}", variant_id))
        .join(format!("model_{}", model_index))
        .join(format!("camera_{}", camera_index))
        .join(part_name)
        .join(format!("{}.png", material_key))
}

/// 发现一个商品变体的全部待上传任务
pub fn discover(
    snapshot: &ProductSnapshot,
    variant_id: i64,
    media_root: &Path,
    part_filter: &HashSet<String>,
) -> Vec<UploadTask> {
    let mut tasks = Vec::new();

    for (model_index, model) in snapshot.models.iter().enumerate() {
        let model_index = model_index + 1;
        let total_cameras = model.cameras.len();

        for (camera_index, camera) in model.cameras.iter().enumerate() {
            let camera_index = camera_index + 1;

            for scene_part in &camera.parts {
                let part_name = &scene_part.part.blender_name;
                if !part_filter.is_empty() && !part_filter.contains(part_name) {
                    continue;
                }

                let total_materials = scene_part.materials.len();
                for (material_index, material) in scene_part.materials.iter().enumerate() {
                    let file_path = media_root.join(expected_relative_path(
                        variant_id,
                        model_index,
                        camera_index,
                        part_name,
                        &material.material,
                    ));

                    if material.has_image() {
                        debug!(
                            "跳过（目录侧已有图）: scene_material={}, part={}",
                            material.id, part_name
                        );
                        continue;
                    }
                    if !file_path.is_file() {
                        debug!("跳过（本地无渲染图）: {:?}", file_path);
                        continue;
                    }

                    tasks.push(UploadTask {
                        material_id: material.id,
                        file_path,
                        variant_id,
                        model_index,
                        camera_index,
                        part_name: part_name.clone(),
                        material_index: material_index + 1,
                        total_materials,
                        total_cameras,
                    });
                }
            }
        }
    }

    debug!(
        "任务发现完成: variant_id={}, tasks={}",
        variant_id,
        tasks.len()
    );
    tasks
}
