//! 基于 chromiumoxide 的站点驱动 - 基础设施层
//!
//! 通过 `JsExecutor` 执行 JS 片段完成所有页面操作。
//! 页面选择器集中在 `DomSelectors` 中，可由 TOML 文件覆盖。

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::infrastructure::board_driver::{BoardDriver, JobListView, PageSignal};
use crate::infrastructure::js_executor::JsExecutor;
use crate::models::{load_toml, ControlKind, FieldValue, JobSummary, Question, WizardField};

/// 页面选择器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomSelectors {
    pub job_list: String,
    pub job_card: String,
    pub card_title: String,
    pub card_company: String,
    pub card_location: String,
    pub card_poster: String,
    pub card_link: String,
    pub no_results: String,
    pub job_description: String,
    pub apply_button: String,
    pub wizard: String,
    pub step_heading: String,
    pub form_element: String,
    pub advance_button: String,
    pub error_banner: String,
    pub daily_limit_banner: String,
    /// 出现在页面文字中即视为当日上限（小写）
    pub daily_limit_text: String,
    pub group_entry: String,
    pub group_remove: String,
    pub group_add: String,
    pub follow_checkbox: String,
    pub dismiss_button: String,
    pub discard_confirm: String,
}

impl Default for DomSelectors {
    fn default() -> Self {
        Self {
            job_list: ".jobs-search-results-list, .scaffold-layout__list".to_string(),
            job_card: "[data-job-id], .job-card-container".to_string(),
            card_title: ".job-card-list__title, .job-card-container__link strong".to_string(),
            card_company: ".job-card-container__primary-description, .artdeco-entity-lockup__subtitle".to_string(),
            card_location: ".job-card-container__metadata-item, .artdeco-entity-lockup__caption".to_string(),
            card_poster: ".job-card-container__hirer-name".to_string(),
            card_link: "a.job-card-container__link, a[href*='/jobs/view/']".to_string(),
            no_results: ".jobs-search-no-results-banner, .jobs-search-two-pane__no-results-banner".to_string(),
            job_description: ".jobs-description__content, .jobs-box__html-content".to_string(),
            apply_button: ".jobs-apply-button".to_string(),
            wizard: ".jobs-easy-apply-modal, [role='dialog']".to_string(),
            step_heading: "h3".to_string(),
            form_element: ".jobs-easy-apply-form-element, .jobs-easy-apply-form-section__grouping, fieldset".to_string(),
            advance_button: "footer button.artdeco-button--primary".to_string(),
            error_banner: ".artdeco-inline-feedback--error".to_string(),
            daily_limit_banner: ".artdeco-inline-feedback--error[data-daily-limit]".to_string(),
            daily_limit_text: "reached today's easy apply limit".to_string(),
            group_entry: ".jobs-easy-apply-repeatable-groupings__groupings > div".to_string(),
            group_remove: "button[aria-label*='Remove'], button[aria-label*='Delete']".to_string(),
            group_add: "button[aria-label*='Add more'], .jobs-easy-apply-repeatable-groupings__add-button".to_string(),
            follow_checkbox: "#follow-company-checkbox".to_string(),
            dismiss_button: "button[aria-label='Dismiss']".to_string(),
            discard_confirm: "button[data-control-name='discard_application_confirm_btn']".to_string(),
        }
    }
}

impl DomSelectors {
    /// 读取选择器覆盖文件；未给出路径时使用默认值
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let selectors = load_toml(path)
                    .await
                    .with_context(|| format!("读取选择器文件失败: {}", path.display()))?;
                info!("✓ 已加载选择器覆盖: {}", path.display());
                Ok(selectors)
            }
            None => Ok(Self::default()),
        }
    }
}

/// 构造带参数的搜索地址
///
/// # 参数
/// - `offset`: 结果偏移量（页码 × 每页数量）
pub fn search_page_url(base: &str, role: &str, location: &str, offset: u32) -> Result<String> {
    let mut url =
        reqwest::Url::parse(base).with_context(|| format!("搜索地址无效: {}", base))?;
    url.query_pairs_mut()
        .append_pair("keywords", role)
        .append_pair("location", location)
        .append_pair("f_AL", "true")
        .append_pair("start", &offset.to_string());
    Ok(url.to_string())
}

/// 页面上的职位卡片
#[derive(Debug, Deserialize)]
struct RawListing {
    title: String,
    company: String,
    poster: Option<String>,
    location: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawJobList {
    state: String,
    #[serde(default)]
    listings: Vec<RawListing>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    id: String,
    kind: ControlKind,
    label: String,
    #[serde(default)]
    options: Vec<String>,
    value: Option<String>,
}

impl From<RawField> for WizardField {
    fn from(raw: RawField) -> Self {
        WizardField {
            id: raw.id,
            question: Question::new(raw.kind, raw.label).with_options(raw.options),
            current_value: raw.value,
        }
    }
}

/// 所有片段共用的辅助函数
const JS_HELPERS: &str = r#"
const textOf = (el) => (el ? (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim() : '');
const norm = (t) => (t || '').replace(/\s+/g, ' ').trim().toLowerCase();
const visible = (el) => !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
const wizard = () => [...document.querySelectorAll(S.wizard)].find(visible) || null;
const labelFor = (input) => {
    const byFor = input.id ? document.querySelector(`label[for="${CSS.escape(input.id)}"]`) : null;
    return textOf(byFor || input.closest('label')) || input.value || '';
};
const labelOf = (el) => {
    const legend = el.querySelector('legend');
    if (legend) return textOf(legend);
    const label = el.querySelector('label');
    if (label) return textOf(label);
    const input = el.querySelector('input, select, textarea');
    return input ? (input.getAttribute('aria-label') || input.getAttribute('placeholder') || '') : textOf(el);
};
const clickLabelled = (input) => {
    const byFor = input.id ? document.querySelector(`label[for="${CSS.escape(input.id)}"]`) : null;
    (byFor || input).click();
};
const collect = (root) => {
    if (!root) return [];
    const fields = [];
    root.querySelectorAll(S.form_element).forEach((el) => {
        if (el.parentElement && el.parentElement.closest(S.form_element)) return;
        let id = el.getAttribute('data-jobpilot-id');
        if (!id) {
            window.__jobpilotSeq = (window.__jobpilotSeq || 0) + 1;
            id = String(window.__jobpilotSeq);
            el.setAttribute('data-jobpilot-id', id);
        }
        const label = labelOf(el);
        const radios = [...el.querySelectorAll('input[type=radio]')];
        const select = el.querySelector('select');
        const checkbox = el.querySelector('input[type=checkbox]');
        const file = el.querySelector('input[type=file]');
        const area = el.querySelector('textarea');
        const input = el.querySelector('input:not([type=hidden]):not([type=radio]):not([type=checkbox]):not([type=file])');
        if (radios.length) {
            const checked = radios.find((r) => r.checked);
            fields.push({ id, kind: 'single_select', label, options: radios.map(labelFor), value: checked ? labelFor(checked) : null });
        } else if (select) {
            const options = [...select.options].map((o) => o.text.trim()).filter((t) => t && !/^select an option$/i.test(t));
            const chosen = select.selectedIndex > 0 ? select.options[select.selectedIndex].text.trim() : null;
            fields.push({ id, kind: 'dropdown', label, options, value: chosen });
        } else if (file) {
            fields.push({ id, kind: 'file', label, options: [], value: file.files && file.files.length ? file.files[0].name : null });
        } else if (checkbox) {
            fields.push({ id, kind: 'checkbox', label: label || labelFor(checkbox), options: [], value: checkbox.checked ? 'true' : null });
        } else if (area) {
            fields.push({ id, kind: 'text', label, options: [], value: area.value.trim() || null });
        } else if (input) {
            const hint = `${input.type} ${input.id} ${input.getAttribute('placeholder') || ''}`.toLowerCase();
            const kind = (input.type === 'number' || hint.includes('numeric')) ? 'numeric'
                : (input.type === 'date' || hint.includes('date') || hint.includes('mm/dd')) ? 'date'
                : 'text';
            fields.push({ id, kind, label, options: [], value: input.value.trim() || null });
        }
    });
    return fields;
};
"#;

/// chromiumoxide 驱动
///
/// 职责：
/// - 把 `BoardDriver` 的每个能力翻译成一段 JS
/// - 不认识 Profile / 回答策略
pub struct DomDriver {
    executor: JsExecutor,
    selectors: DomSelectors,
    search_url: String,
    page_size: u32,
    settle: Duration,
}

impl DomDriver {
    /// # 参数
    /// - `search_url`: 搜索页地址，查询参数由驱动追加
    pub fn new(executor: JsExecutor, selectors: DomSelectors, search_url: impl Into<String>) -> Self {
        Self {
            executor,
            selectors,
            search_url: search_url.into(),
            page_size: 25,
            settle: Duration::from_millis(600),
        }
    }

    /// 拼出完整的 JS：注入选择器、参数和辅助函数
    fn script(&self, args: JsonValue, body: &str) -> Result<String> {
        let selectors = serde_json::to_string(&self.selectors)?;
        Ok(format!(
            "(async () => {{\nconst S = {};\nconst A = {};\n{}\n{}\n}})()",
            selectors, args, JS_HELPERS, body
        ))
    }

    async fn run(&self, args: JsonValue, body: &str) -> Result<JsonValue> {
        let js = self.script(args, body)?;
        self.executor.eval(js).await
    }

    async fn run_as<T: serde::de::DeserializeOwned>(&self, args: JsonValue, body: &str) -> Result<T> {
        let js = self.script(args, body)?;
        self.executor.eval_as(js).await
    }

    async fn upload_file(&self, field_id: &str, path: &str) -> Result<()> {
        if !Path::new(path).exists() {
            return Err(anyhow!("简历文件不存在: {}", path));
        }
        let selector = format!(
            "[data-jobpilot-id=\"{id}\"] input[type=file], input[type=file][data-jobpilot-id=\"{id}\"]",
            id = field_id
        );
        let element = self
            .executor
            .page()
            .find_element(selector)
            .await
            .context("找不到文件上传控件")?;
        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string()])
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|e| anyhow!("构造上传参数失败: {}", e))?;
        self.executor.page().execute(params).await?;
        debug!("📎 已上传文件: {}", path);
        Ok(())
    }
}

#[async_trait]
impl BoardDriver for DomDriver {
    async fn open_search(&self, role: &str, location: &str, page: u32) -> Result<()> {
        let url = search_page_url(&self.search_url, role, location, page * self.page_size)?;
        debug!("打开搜索页: {}", url);
        self.executor.navigate(&url).await?;
        sleep(self.settle).await;
        Ok(())
    }

    async fn find_job_list(&self) -> Result<JobListView> {
        let raw: RawJobList = self
            .run_as(
                json!({}),
                r#"
                if (document.querySelector(S.no_results)) return { state: 'no_results', listings: [] };
                const list = document.querySelector(S.job_list);
                if (!list) return { state: 'missing', listings: [] };
                const pick = (card, sel) => textOf(sel ? card.querySelector(sel) : null);
                const listings = [...list.querySelectorAll(S.job_card)].map((card) => {
                    const link = card.querySelector(S.card_link);
                    return {
                        title: pick(card, S.card_title),
                        company: pick(card, S.card_company),
                        poster: pick(card, S.card_poster) || null,
                        location: pick(card, S.card_location),
                        url: link ? link.href : '',
                    };
                }).filter((job) => job.url && job.title);
                return { state: 'listings', listings };
                "#,
            )
            .await?;

        Ok(match raw.state.as_str() {
            "no_results" => JobListView::NoResults,
            "missing" => JobListView::Missing,
            _ => JobListView::Listings(
                raw.listings
                    .into_iter()
                    .map(|l| JobSummary::new(&l.title, &l.company, l.poster, &l.location, &l.url))
                    .collect(),
            ),
        })
    }

    async fn open_job(&self, job: &JobSummary) -> Result<()> {
        let clicked = self
            .run(
                json!({ "url": job.url }),
                r#"
                const strip = (href) => href.split(/[?#]/)[0].replace(/\/+$/, '');
                const link = [...document.querySelectorAll(S.card_link)].find((a) => strip(a.href) === A.url);
                if (!link) return false;
                link.scrollIntoView({ block: 'center' });
                link.click();
                return true;
                "#,
            )
            .await?;

        if clicked.as_bool() != Some(true) {
            debug!("列表中找不到职位卡片，直接打开: {}", job.url);
            self.executor.navigate(&job.url).await?;
        }
        sleep(self.settle).await;
        Ok(())
    }

    async fn job_description(&self) -> Result<String> {
        let text = self
            .run(json!({}), "return textOf(document.querySelector(S.job_description));")
            .await?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    async fn start_wizard(&self) -> Result<bool> {
        let clicked = self
            .run(
                json!({}),
                r#"
                const button = [...document.querySelectorAll(S.apply_button)].find(visible);
                if (!button || button.disabled) return false;
                button.click();
                for (let i = 0; i < 20; i++) {
                    if (wizard()) return true;
                    await new Promise((r) => setTimeout(r, 150));
                }
                return false;
                "#,
            )
            .await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn find_step_heading(&self) -> Result<Option<String>> {
        let heading = self
            .run(
                json!({}),
                r#"
                const root = wizard();
                if (!root) return null;
                return textOf(root.querySelector(S.step_heading)) || null;
                "#,
            )
            .await?;
        Ok(heading.as_str().map(str::to_string))
    }

    async fn fields(&self) -> Result<Vec<WizardField>> {
        let raw: Vec<RawField> = self.run_as(json!({}), "return collect(wizard());").await?;
        Ok(raw.into_iter().map(WizardField::from).collect())
    }

    async fn fill_field(&self, field_id: &str, value: &FieldValue) -> Result<()> {
        if let FieldValue::File(path) = value {
            return self.upload_file(field_id, path).await;
        }

        let status = self
            .run(
                json!({ "id": field_id, "value": value }),
                r#"
                const el = document.querySelector(`[data-jobpilot-id="${A.id}"]`);
                if (!el) return 'missing';
                const v = A.value;
                if (v.type === 'check') {
                    const box = el.querySelector('input[type=checkbox]');
                    if (!box) return 'no_checkbox';
                    if (box.checked !== v.value) clickLabelled(box);
                    return 'ok';
                }
                if (v.type === 'choice') {
                    const radios = [...el.querySelectorAll('input[type=radio]')];
                    if (radios.length) {
                        const radio = radios.find((r) => norm(labelFor(r)) === norm(v.value));
                        if (!radio) return 'no_option';
                        clickLabelled(radio);
                        return 'ok';
                    }
                    const select = el.querySelector('select');
                    if (select) {
                        const option = [...select.options].find((o) => norm(o.text) === norm(v.value));
                        if (!option) return 'no_option';
                        select.value = option.value;
                        select.dispatchEvent(new Event('change', { bubbles: true }));
                        return 'ok';
                    }
                }
                const input = el.querySelector('textarea, input:not([type=hidden]):not([type=radio]):not([type=checkbox]):not([type=file])');
                if (!input) return 'no_input';
                const proto = input.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
                Object.getOwnPropertyDescriptor(proto, 'value').set.call(input, String(v.value));
                input.dispatchEvent(new Event('input', { bubbles: true }));
                input.dispatchEvent(new Event('change', { bubbles: true }));
                if (input.getAttribute('role') === 'combobox') {
                    await new Promise((r) => setTimeout(r, 800));
                    const suggestion = document.querySelector('[role=listbox] [role=option]');
                    if (suggestion) suggestion.click();
                }
                return 'ok';
                "#,
            )
            .await?;

        match status.as_str() {
            Some("ok") => Ok(()),
            other => Err(anyhow!(
                "填写字段 {} 失败: {}",
                field_id,
                other.unwrap_or("unknown")
            )),
        }
    }

    async fn clear_group_entries(&self) -> Result<usize> {
        let removed = self
            .run(
                json!({}),
                r#"
                const root = wizard();
                if (!root) return 0;
                let removed = 0;
                for (let guard = 0; guard < 20; guard++) {
                    const button = [...root.querySelectorAll(S.group_entry)]
                        .flatMap((entry) => [...entry.querySelectorAll(S.group_remove)])
                        .find(visible);
                    if (!button) break;
                    button.click();
                    removed += 1;
                    await new Promise((r) => setTimeout(r, 300));
                }
                return removed;
                "#,
            )
            .await?;
        Ok(removed.as_u64().unwrap_or(0) as usize)
    }

    async fn add_group_entry(&self) -> Result<()> {
        let clicked = self
            .run(
                json!({}),
                r#"
                const root = wizard();
                const button = root ? [...root.querySelectorAll(S.group_add)].find(visible) : null;
                if (!button) return false;
                button.click();
                await new Promise((r) => setTimeout(r, 400));
                return true;
                "#,
            )
            .await?;
        if clicked.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(anyhow!("找不到\"添加另一条\"按钮"))
        }
    }

    async fn group_fields(&self, entry: usize) -> Result<Vec<WizardField>> {
        let raw: Vec<RawField> = self
            .run_as(
                json!({ "entry": entry }),
                r#"
                const root = wizard();
                if (!root) return [];
                const entries = [...root.querySelectorAll(S.group_entry)];
                return collect(entries[A.entry] || (A.entry === 0 ? root : null));
                "#,
            )
            .await?;
        Ok(raw.into_iter().map(WizardField::from).collect())
    }

    async fn advance_label(&self) -> Result<Option<String>> {
        let label = self
            .run(
                json!({}),
                r#"
                const root = wizard();
                const button = root ? [...root.querySelectorAll(S.advance_button)].find(visible) : null;
                if (!button) return null;
                return textOf(button) || button.getAttribute('aria-label') || null;
                "#,
            )
            .await?;
        Ok(label.as_str().map(str::to_string))
    }

    async fn advance(&self) -> Result<()> {
        let clicked = self
            .run(
                json!({}),
                r#"
                const root = wizard();
                const button = root ? [...root.querySelectorAll(S.advance_button)].find(visible) : null;
                if (!button) return false;
                button.click();
                return true;
                "#,
            )
            .await?;
        if clicked.as_bool() != Some(true) {
            return Err(anyhow!("找不到前进按钮"));
        }
        sleep(self.settle).await;
        Ok(())
    }

    async fn page_signal(&self) -> Result<PageSignal> {
        let signal = self
            .run(
                json!({}),
                r#"
                if (document.querySelector(S.daily_limit_banner)) return { kind: 'daily_limit' };
                if (norm(document.body.innerText).includes(norm(S.daily_limit_text))) return { kind: 'daily_limit' };
                const root = wizard();
                const banner = root ? [...root.querySelectorAll(S.error_banner)].find(visible) : null;
                if (banner) return { kind: 'validation', text: textOf(banner) };
                return { kind: 'clear' };
                "#,
            )
            .await?;

        Ok(match signal.get("kind").and_then(|k| k.as_str()) {
            Some("daily_limit") => PageSignal::DailyLimit,
            Some("validation") => PageSignal::ValidationError(
                signal
                    .get("text")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            _ => PageSignal::Clear,
        })
    }

    async fn set_follow_company(&self, follow: bool) -> Result<()> {
        let found = self
            .run(
                json!({ "follow": follow }),
                r#"
                const box = document.querySelector(S.follow_checkbox);
                if (!box) return false;
                if (box.checked !== A.follow) clickLabelled(box);
                return true;
                "#,
            )
            .await?;
        if found.as_bool() != Some(true) {
            debug!("没有找到关注公司选项");
        }
        Ok(())
    }

    async fn discard_wizard(&self) -> Result<()> {
        let closed = self
            .run(
                json!({}),
                r#"
                const dismiss = [...document.querySelectorAll(S.dismiss_button)].find(visible);
                if (!dismiss) return false;
                dismiss.click();
                await new Promise((r) => setTimeout(r, 400));
                const confirm = [...document.querySelectorAll(S.discard_confirm)].find(visible);
                if (confirm) confirm.click();
                return true;
                "#,
            )
            .await?;
        if closed.as_bool() != Some(true) {
            warn!("⚠️ 没有找到关闭向导的按钮");
        }
        sleep(self.settle).await;
        Ok(())
    }
}
