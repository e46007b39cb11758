use crate::workflow::MAX_STEPS;

/// 程序运行配置（环境变量覆盖默认值）
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（非无头模式下连接已登录的浏览器）
    pub browser_debug_port: u16,
    /// 是否启动无头浏览器
    pub headless: bool,
    /// 无头模式使用的浏览器可执行文件
    pub chrome_path: Option<String>,
    /// 站点首页
    pub board_url: String,
    /// 搜索页地址（查询参数由驱动追加）
    pub search_url: String,
    /// DOM 选择器覆盖文件
    pub selectors_file: Option<String>,
    /// 单个向导最多前进的步数，超过视为页面结构异常
    pub max_wizard_steps: usize,
    // --- 档案与产物 ---
    pub profile_path: String,
    pub ledger_path: String,
    pub applied_csv: String,
    pub failed_csv: String,
    pub unprepared_log: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 协作方配置 ---
    /// 设置后使用 HTTP 协作方，否则使用 LLM
    pub collaborator_url: Option<String>,
    pub collaborator_timeout_secs: u64,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_path: None,
            board_url: "https://www.linkedin.com/jobs/".to_string(),
            search_url: "https://www.linkedin.com/jobs/search/".to_string(),
            selectors_file: None,
            max_wizard_steps: MAX_STEPS,
            profile_path: "profile.toml".to_string(),
            ledger_path: "applied_jobs.json".to_string(),
            applied_csv: "applied.csv".to_string(),
            failed_csv: "failed.csv".to_string(),
            unprepared_log: "unprepared_questions.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            collaborator_url: None,
            collaborator_timeout_secs: 30,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", default.browser_debug_port),
            headless: env_parse("HEADLESS", default.headless),
            chrome_path: env_optional("CHROME_PATH").or(default.chrome_path),
            board_url: std::env::var("BOARD_URL").unwrap_or(default.board_url),
            search_url: std::env::var("SEARCH_URL").unwrap_or(default.search_url),
            selectors_file: env_optional("SELECTORS_FILE").or(default.selectors_file),
            max_wizard_steps: env_parse("MAX_WIZARD_STEPS", default.max_wizard_steps),
            profile_path: std::env::var("PROFILE_PATH").unwrap_or(default.profile_path),
            ledger_path: std::env::var("LEDGER_PATH").unwrap_or(default.ledger_path),
            applied_csv: std::env::var("APPLIED_CSV").unwrap_or(default.applied_csv),
            failed_csv: std::env::var("FAILED_CSV").unwrap_or(default.failed_csv),
            unprepared_log: std::env::var("UNPREPARED_LOG").unwrap_or(default.unprepared_log),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
            collaborator_url: env_optional("COLLABORATOR_URL").or(default.collaborator_url),
            collaborator_timeout_secs: env_parse(
                "COLLABORATOR_TIMEOUT_SECS",
                default.collaborator_timeout_secs,
            ),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 站点主机名，用于复用已打开的页面
    pub fn board_host(&self) -> Option<String> {
        reqwest::Url::parse(&self.board_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}
