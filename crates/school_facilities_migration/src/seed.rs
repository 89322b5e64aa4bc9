//! 初始化数据：默认董事会、学校与管理员账号
//!
//! 这些固定 ID 属于部署数据而不是代码逻辑，可以通过 JSON 文件整体替换，
//! 内置的默认值与最初上线环境保持一致。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SeedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSeed {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSeed {
    pub id: String,
    pub name: String,
    pub board_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSeed {
    pub id: String,
    pub email: String,
    pub display_name: String,
    /// 为空时账号无法用密码登录，需要通过重置流程设置密码
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub boards: Vec<BoardSeed>,
    pub schools: Vec<SchoolSeed>,
    /// 自动分配学校时使用的默认学校，为空时取 ID 最小的学校
    pub default_school_id: Option<String>,
    pub admin: AdminSeed,
    /// 每所学校的存储桶名为 `{bucket_prefix}-{school_id}`
    pub bucket_prefix: String,
}

const NORTHFIELD_BOARD_ID: &str = "d3b07384-d9a0-4c9b-8f2a-1b6c3e2f0a01";
const RIVERSIDE_BOARD_ID: &str = "d3b07384-d9a0-4c9b-8f2a-1b6c3e2f0a02";

const DEFAULT_SCHOOLS: [(&str, &str, &str); 9] = [
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a01", "Northfield Primary School", NORTHFIELD_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a02", "Oakwood Primary School", NORTHFIELD_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a03", "Hillcrest Academy", NORTHFIELD_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a04", "St. Mary's Primary School", NORTHFIELD_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a05", "Meadowbank School", NORTHFIELD_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a06", "Riverside Primary School", RIVERSIDE_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a07", "Willow Lane School", RIVERSIDE_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a08", "Harbour View Academy", RIVERSIDE_BOARD_ID),
    ("7f1c2e9a-5b3d-4e8f-9a6c-0d4b2e1f3a09", "Kingsbridge College", RIVERSIDE_BOARD_ID),
];

impl Default for SeedData {
    fn default() -> Self {
        Self {
            boards: vec![
                BoardSeed {
                    id: NORTHFIELD_BOARD_ID.to_string(),
                    name: "Northfield Schools Trust".to_string(),
                },
                BoardSeed {
                    id: RIVERSIDE_BOARD_ID.to_string(),
                    name: "Riverside Education Board".to_string(),
                },
            ],
            schools: DEFAULT_SCHOOLS
                .iter()
                .map(|(id, name, board_id)| SchoolSeed {
                    id: id.to_string(),
                    name: name.to_string(),
                    board_id: Some(board_id.to_string()),
                })
                .collect(),
            default_school_id: Some(DEFAULT_SCHOOLS[0].0.to_string()),
            admin: AdminSeed::default(),
            bucket_prefix: "school".to_string(),
        }
    }
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            id: "00000000-0000-4000-8000-000000000001".to_string(),
            email: "admin@school-facilities.local".to_string(),
            display_name: "Administrator".to_string(),
            password_hash: None,
        }
    }
}

impl SeedData {
    /// 检查 ID 唯一性与引用关系
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut board_ids = HashSet::new();
        for board in &self.boards {
            if !board_ids.insert(board.id.as_str()) {
                return Err(SeedError::DuplicateId(board.id.clone()));
            }
        }

        let mut school_ids = HashSet::new();
        for school in &self.schools {
            if !school_ids.insert(school.id.as_str()) {
                return Err(SeedError::DuplicateId(school.id.clone()));
            }
            if let Some(board_id) = &school.board_id {
                if !board_ids.contains(board_id.as_str()) {
                    return Err(SeedError::UnknownBoard {
                        school: school.id.clone(),
                        board: board_id.clone(),
                    });
                }
            }
        }

        if let Some(default_school_id) = &self.default_school_id {
            if !school_ids.contains(default_school_id.as_str()) {
                return Err(SeedError::UnknownDefaultSchool(default_school_id.clone()));
            }
        }

        if self.admin.id.trim().is_empty() {
            return Err(SeedError::EmptyAdminId);
        }

        Ok(())
    }

    pub fn bucket_name(&self, school_id: &str) -> String {
        format!("{}-{}", self.bucket_prefix, school_id).to_lowercase()
    }
}
