//! 槽位登记 - 业务能力层
//!
//! 只保存"每个槽位当前是哪个文档"以及当前格式模式

use std::collections::BTreeMap;

use crate::models::{DocumentSlot, FileFormat, UploadedDocument};

/// 槽位登记表
///
/// 不校验扩展名，调用方在上传前自行比对格式
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    format: FileFormat,
    slots: BTreeMap<DocumentSlot, UploadedDocument>,
}

impl SlotRegistry {
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            slots: BTreeMap::new(),
        }
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// 切换格式模式，已上传的文档保持不变
    pub fn set_format(&mut self, format: FileFormat) {
        self.format = format;
    }

    /// 整体替换槽位内容，`None` 表示清空
    pub fn set_slot(&mut self, slot: DocumentSlot, document: Option<UploadedDocument>) {
        match document {
            Some(document) => {
                self.slots.insert(slot, document);
            }
            None => {
                self.slots.remove(&slot);
            }
        }
    }

    pub fn get(&self, slot: DocumentSlot) -> Option<&UploadedDocument> {
        self.slots.get(&slot)
    }

    /// 当前有文档的槽位
    pub fn populated(&self) -> impl Iterator<Item = (DocumentSlot, &UploadedDocument)> {
        self.slots.iter().map(|(slot, doc)| (*slot, doc))
    }
}
