//! 职位处理上下文
//!
//! 封装"我正在处理哪个目标、哪一页的第几个职位"这一信息

use std::fmt::Display;

/// 职位处理上下文（仅用于日志和报告）
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 搜索目标（角色名）
    pub target: String,

    pub location: String,

    /// 结果页页码（从0开始）
    pub page: u32,

    /// 职位在本页候选中的序号（从1开始）
    pub index: usize,
}

impl JobCtx {
    pub fn new(target: impl Into<String>, location: impl Into<String>, page: u32, index: usize) -> Self {
        Self {
            target: target.into(),
            location: location.into(),
            page,
            index,
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{} 第{}页 #{}]",
            self.target,
            self.location,
            self.page + 1,
            self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = JobCtx::new("sales", "remote", 0, 3);
        assert_eq!(ctx.to_string(), "[sales/remote 第1页 #3]");
    }
}
