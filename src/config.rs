use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ConfigError;

/// API 版本选择
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiVersion {
    /// 优先新版，失败时回退到旧版
    Auto,
    /// 固定使用旧版
    Legacy,
    /// 固定使用新版
    Current,
}

impl ApiVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(ApiVersion::Auto),
            "old" | "legacy" | "v1" => Some(ApiVersion::Legacy),
            "new" | "current" | "v2" => Some(ApiVersion::Current),
            _ => None,
        }
    }
}

/// 输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// 标准 JSON 数组
    Json,
    /// 刷题平台导入用的类 JSON 文本
    JsonLike,
    /// 两种都输出
    Both,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "jsonlike" | "json-like" | "txt" => Some(OutputFormat::JsonLike),
            "both" | "all" => Some(OutputFormat::Both),
            _ => None,
        }
    }

    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn writes_json_like(self) -> bool {
        matches!(self, OutputFormat::JsonLike | OutputFormat::Both)
    }
}

/// 要导出的章节
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChapterSelection {
    All,
    Ids(BTreeSet<String>),
}

impl ChapterSelection {
    /// 解析 `all` 或逗号分隔的章节 nodeId 列表，空串视为全部
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return ChapterSelection::All;
        }
        let ids: BTreeSet<String> = s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();
        if ids.is_empty() {
            ChapterSelection::All
        } else {
            ChapterSelection::Ids(ids)
        }
    }

    pub fn includes(&self, node_id: &str) -> bool {
        match self {
            ChapterSelection::All => true,
            ChapterSelection::Ids(ids) => ids.contains(node_id),
        }
    }
}

/// 导出选项（替代交互式提问）
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// 是否为每道题保存 question_info.txt
    pub save_per_question_files: bool,
    /// 要导出的章节
    pub chapters: ChapterSelection,
    /// 输出格式
    pub format: OutputFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            save_per_question_files: false,
            chapters: ChapterSelection::All,
            format: OutputFormat::Json,
        }
    }
}

/// 单次请求的超时分级
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    /// 答案查询
    pub short: Duration,
    /// 普通请求
    pub default: Duration,
    /// 整章内容
    pub long: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(10),
            default: Duration::from_secs(15),
            long: Duration::from_secs(20),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 课程ID
    pub course_id: String,
    /// 班级ID
    pub class_id: String,
    /// authorization 请求头
    pub authorization_token: String,
    /// ua-authorization 请求头，为空时与 authorization 相同
    pub ua_authorization_token: String,
    /// API 基础地址
    pub base_api_url: String,
    /// 导出根目录
    pub base_output_dir: String,
    /// API 版本
    pub api_version: ApiVersion,
    /// 调用新版接口前是否先做 OPTIONS 探测
    pub probe_endpoints: bool,
    /// 启动时是否通过用户信息接口检测可用版本
    pub detect_api_on_start: bool,
    /// 导出选项
    pub export: ExportOptions,
    /// 超时
    pub timeouts: Timeouts,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            course_id: String::new(),
            class_id: String::new(),
            authorization_token: String::new(),
            ua_authorization_token: String::new(),
            base_api_url: "https://api.ulearning.cn".to_string(),
            base_output_dir: "ulearning_courseware_exports".to_string(),
            api_version: ApiVersion::Auto,
            probe_endpoints: false,
            detect_api_on_start: false,
            export: ExportOptions::default(),
            timeouts: Timeouts::default(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，解析失败的值回退为默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };
        let flag = |key: &str, fallback: bool| {
            lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(fallback)
        };

        let authorization_token = lookup("AUTHORIZATION_TOKEN").unwrap_or(default.authorization_token);
        let ua_authorization_token = lookup("UA_AUTHORIZATION_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| authorization_token.clone());

        Self {
            course_id: lookup("COURSE_ID").unwrap_or(default.course_id),
            class_id: lookup("CLASS_ID").unwrap_or(default.class_id),
            authorization_token,
            ua_authorization_token,
            base_api_url: lookup("BASE_API_URL").unwrap_or(default.base_api_url),
            base_output_dir: lookup("BASE_OUTPUT_DIR").unwrap_or(default.base_output_dir),
            api_version: lookup("API_VERSION").and_then(|v| ApiVersion::parse(&v)).unwrap_or(default.api_version),
            probe_endpoints: flag("PROBE_ENDPOINTS", default.probe_endpoints),
            detect_api_on_start: flag("DETECT_API_ON_START", default.detect_api_on_start),
            export: ExportOptions {
                save_per_question_files: flag("SAVE_QUESTION_FILES", default.export.save_per_question_files),
                chapters: lookup("SELECTED_CHAPTERS").map(|v| ChapterSelection::parse(&v)).unwrap_or(default.export.chapters),
                format: lookup("OUTPUT_FORMAT").and_then(|v| OutputFormat::parse(&v)).unwrap_or(default.export.format),
            },
            timeouts: Timeouts {
                short: secs("ANSWER_TIMEOUT_SECS", default.timeouts.short),
                default: secs("REQUEST_TIMEOUT_SECS", default.timeouts.default),
                long: secs("CONTENT_TIMEOUT_SECS", default.timeouts.long),
            },
            verbose_logging: flag("VERBOSE_LOGGING", default.verbose_logging),
        }
    }

    /// 检查必填项是否为空
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("COURSE_ID", &self.course_id),
            ("CLASS_ID", &self.class_id),
            ("AUTHORIZATION_TOKEN", &self.authorization_token),
            ("BASE_API_URL", &self.base_api_url),
        ];
        for (var_name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EnvVarNotFound {
                    var_name: var_name.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
