use chrono::NaiveDate;
use serde::Serialize;

use crate::models::research::{Metric, PriceBasis};
use crate::services::heatmap::{best_rise, worst_decline, BinSummary};
use crate::services::probability::{score_groups, BurstGroupStats, RightSkewShare};
use crate::services::statistic::StatMethod;
use crate::services::timing::{Stage, TimingEvent, TimingReport};

/// 爆发机率表最多放进提示词的行数
const PROBABILITY_TABLE_ROWS: usize = 20;
/// 时机研究个股明细最多放进提示词的行数
const TIMING_TABLE_ROWS: usize = 300;

/// 带有提示词的外部 AI 对话链接
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiLinks {
    pub chatgpt: String,
    pub claude: String,
    /// DeepSeek 不支持预填，只能手动贴上
    pub deepseek: String,
}

impl AiLinks {
    pub fn for_prompt(prompt: &str) -> Self {
        let encoded = urlencoding::encode(prompt);
        Self {
            chatgpt: format!("https://chatgpt.com/?q={encoded}"),
            claude: format!("https://claude.ai/new?q={encoded}"),
            deepseek: "https://chat.deepseek.com/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
    pub links: AiLinks,
}

impl PromptResponse {
    pub fn new(prompt: String) -> Self {
        let links = AiLinks::for_prompt(&prompt);
        Self { prompt, links }
    }
}

/// 固定小数位，缺值或非有限数显示为 N/A
fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "N/A".to_string(),
    }
}

/// 整数加上千分位逗号，负号保留在最前
fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

pub struct HeatmapBrief<'a> {
    pub year: i32,
    pub metric: Metric,
    pub method: StatMethod,
    pub basis: PriceBasis,
    pub total_samples: i64,
    pub summary: &'a [BinSummary],
    pub today: NaiveDate,
}

fn summary_table(summary: &[BinSummary]) -> String {
    let mut t = String::from(
        "| 漲幅區間 | 股票數量 | 均漲幅 | 均營收 | 中位數 | 標準差 | 最小值 | 最大值 | 變異係數 | 四分位距 | 正成長% |\n\
         |----------|----------|--------|--------|--------|--------|--------|--------|----------|----------|---------|\n",
    );
    for b in summary {
        t.push_str(&format!(
            "| {} | {}檔 | {}% | {}% | {}% | {} | {}% | {}% | {} | {} | {}% |\n",
            b.bin_label,
            b.stock_count,
            fmt_opt(b.avg_return, 1),
            fmt_opt(b.mean, 1),
            fmt_opt(b.median, 1),
            fmt_opt(b.std_dev, 1),
            fmt_opt(b.min, 1),
            fmt_opt(b.max, 1),
            fmt_opt(b.cv, 2),
            fmt_opt(b.iqr, 1),
            fmt_opt(b.positive_rate, 1),
        ));
    }
    t
}

impl HeatmapBrief<'_> {
    pub fn render(&self) -> String {
        match self.basis {
            PriceBasis::Close => self.render_close(),
            PriceBasis::High => self.render_high(),
        }
    }

    fn render_close(&self) -> String {
        let falling: i64 = self.summary.iter().filter(|b| b.decline).map(|b| b.stock_count).sum();
        let rising: i64 = self.summary.iter().filter(|b| !b.decline).map(|b| b.stock_count).sum();
        let ratio = |n: i64| {
            if self.total_samples > 0 {
                n as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            }
        };
        let extreme = |b: Option<&BinSummary>| match b {
            Some(b) => format!(
                "{} (平均股價漲幅{}%，營收正增長比例{}%)",
                b.bin_label,
                fmt_opt(b.avg_return, 1),
                fmt_opt(b.positive_rate, 1)
            ),
            None => "無資料 (平均股價漲幅0.0%，營收正增長比例0.0%)".to_string(),
        };

        let mut p = String::new();
        p.push_str("# 台股營收與股價關聯分析報告\n");
        p.push_str(&format!("分析時間: {}\n", self.today.format("%Y-%m-%d")));
        p.push_str(&format!("分析年度: {}年\n", self.year));
        p.push_str(&format!("成長指標: {}\n", self.metric.label()));
        p.push_str(&format!("統計方法: {}\n", self.method.title()));
        p.push_str(&format!("總樣本數: {}檔\n", thousands(self.total_samples)));
        p.push_str(&format!("下跌股票比例: {:.1}% ({}檔)\n", ratio(falling), thousands(falling)));
        p.push_str(&format!("上漲股票比例: {:.1}% ({}檔)\n", ratio(rising), thousands(rising)));
        p.push_str(
            "\n## 重要數據說明\n\
             **這是「按股價漲幅分組看營收表現」，分組間隔為：下跌每10%，上漲每100%**\n\n\
             1. **分組依據**：先按照股票「年度實際漲幅」分成不同區間\n\
             \x20  - 下跌股票：每10%一個間隔（共11個區間，從-100%以下到-10%~0%）\n\
             \x20  - 上漲股票：每100%一個間隔（共11個區間，從0-100%到1000%以上）\n\
             2. **觀察指標**：在每個股價漲幅區間內，計算該區間股票的營收全維度表現\n\n",
        );
        p.push_str("### 關鍵發現：\n");
        p.push_str(&format!("1. **最慘的下跌區間**: {}\n", extreme(worst_decline(self.summary))));
        p.push_str(&format!("2. **最好的上漲區間**: {}\n", extreme(best_rise(self.summary))));
        p.push_str("\n## 數據摘要全表 (包含離散指標)\n");
        p.push_str(&summary_table(self.summary));
        p.push_str(
            "\n## 分析任務\n\
             請擔任專業量化分析師，根據以上細分數據回答：\n\n\
             ### 1. 下跌股票的梯度分析（每10%一個等級）\n\
             - 越深的跌幅，營收表現是否越差？哪個跌幅區間開始明顯惡化？\n\
             - 輕微下跌股（跌10%以內）vs 重度下跌股（跌50%以上）的營收差異有多大？\n\n\
             ### 2. 上漲股票的層級分析（每100%一個等級）\n\
             - 漲得越高的股票，營收表現是否越好？甜蜜點在哪個區間？\n\
             - 極端上漲股（漲500%以上）是持續高成長還是波動大？\n\n\
             ### 3. 對比分析：下跌vs上漲\n\
             - 營收正增長比例的差距有多大？\n\
             - 利用變異係數與標準差，指出營收波動最大的區間\n\
             - 參考中位數與平均值的偏離，找出「股價跌但營收好」或「股價漲但營收差」的案例\n\n\
             ### 4. 投資策略啟示\n\
             - 哪個跌幅區間最適合抄底？要找潛在飆股應關注哪些營收特徵？\n\
             - 哪些跌幅區間應該絕對避免？\n\n\
             ## 重要提醒\n\
             1. 下跌10%間隔 vs 上漲100%間隔，反映市場特性\n\
             2. 極端區間（如-100%以下或1000%以上）可能股票很少\n",
        );
        p.push_str(&format!(
            "3. {}年1月看到的是前一年12月營收\n4. 小樣本區間的結論需謹慎\n\n請用中文回答，每個觀點都要有具體的數據支持。\n",
            self.year
        ));
        p
    }

    fn render_high(&self) -> String {
        let mut p = String::new();
        p.push_str("# 台股營收與股價最大潛力漲幅分析報告（最高價版本）\n\n");
        p.push_str("## 分析設定\n");
        p.push_str(&format!("- **分析年度**: {}年\n", self.year));
        p.push_str(&format!("- **指標類型**: {}\n", self.metric.label()));
        p.push_str(&format!("- **統計模式**: {}\n", self.method.title()));
        p.push_str(&format!("- **樣本規模**: {}檔股票\n", thousands(self.total_samples)));
        p.push_str("- **數據特性**: 使用「年度最高價」計算潛在最大漲幅\n\n");
        p.push_str(
            "## 重要提醒\n\
             1. **這是「最高價版本」**：代表「如果賣在年度最高點」的潛在報酬\n\
             2. **沒有下跌區間**：最高價一定不低於開盤價，所有股票都在上漲區間\n\
             3. **樂觀情境**：顯示股價可能達到的理論最大值\n\
             4. **波動更大**：數值通常比收盤價版本更高、更極端\n\n\
             ## 統計摘要\n",
        );
        if self.summary.is_empty() {
            p.push_str("無統計數據\n");
        } else {
            p.push_str(&summary_table(self.summary));
        }
        p.push_str(
            "\n## 分析任務\n\
             ### 1. 最大潛力分析\n\
             - 不同營收表現的股票「最大可能漲幅」分佈如何？哪些特徵有機會衝到500%以上？\n\
             ### 2. 目標價設定參考\n\
             - 投資人應如何參考最高價數據設定合理的目標價位？\n\
             ### 3. 風險考量\n\
             - 如何平衡「追求最高價」與「實際可實現報酬」？\n\
             ### 4. 策略建議\n\
             - 如何搭配營收波動等指標提高賣在相對高點的機率？\n\n\
             請用中文回答，結構清晰，並提供具體的數據支持。\n",
        );
        p
    }
}

pub struct ProbabilityBrief<'a> {
    pub year: i32,
    pub metric: Metric,
    pub basis: PriceBasis,
    pub low: i32,
    pub high: i32,
    pub groups: &'a [BurstGroupStats],
}

impl ProbabilityBrief<'_> {
    pub fn render(&self) -> String {
        let price = self.basis.label();
        let edition = self.basis.edition();

        let table = if self.groups.is_empty() {
            "無數據".to_string()
        } else {
            let mut t = String::from(
                "| 爆發次數 | 股票檔數 | 平均年度漲幅% | 中位數漲幅% | 勝率(>20%) | 翻倍率(>100%) | 最低漲幅% | 最高漲幅% | 標準差% |\n\
                 | --- | --- | --- | --- | --- | --- | --- | --- | --- |\n",
            );
            for g in self.groups.iter().take(PROBABILITY_TABLE_ROWS) {
                t.push_str(&format!(
                    "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |\n",
                    g.hits,
                    g.stock_count,
                    g.avg_return,
                    g.median_return,
                    g.win_rate,
                    g.double_rate,
                    g.min_return,
                    g.max_return,
                    g.std_dev
                ));
            }
            t
        };

        let mut p = String::new();
        p.push_str(&format!("# {}年台股營收爆發次數與年度報酬關聯分析\n\n", self.year));
        p.push_str("## 研究設定\n");
        p.push_str(&format!("- **分析年度**: {}年\n", self.year));
        p.push_str(&format!("- **研究指標**: {}\n", self.metric.label()));
        p.push_str(&format!("- **股價計算方式**: {edition} (使用{price}計算漲幅)\n"));
        p.push_str(&format!("- **爆發門檻**: {}% 至 {}%\n", self.low, self.high));
        p.push_str(&format!("- **研究期間**: 前一年12月到{}年11月（12個月份）\n\n", self.year));
        p.push_str("## 價格計算方式說明\n");
        p.push_str(&format!("- **{edition}**: {price}漲幅 = (({price} - 年開盤價) / 年開盤價) × 100%\n"));
        p.push_str(
            "- 「最高價 (極限版)」代表年度最大潛在漲幅（理論最大值）\n\
             - 「收盤價 (實戰版)」代表實際年度報酬（可實現報酬）\n\n\
             ## 統計數據摘要\n",
        );
        p.push_str(&table);
        let skew = RightSkewShare::from_scores(&score_groups(self.groups));
        if skew.total > 0 {
            p.push_str(&format!(
                "\n- {}/{} 個區間({:.1}%) 平均數 > 中位數\n",
                skew.above, skew.total, skew.rate
            ));
        }
        p.push_str(
            "\n## 分析問題\n\
             ### 1. 相關性分析\n\
             - 「爆發次數」與「平均年度漲幅」、「中位數漲幅」、「勝率(>20%)」之間是否存在正相關？\n\
             ### 2. 平均數與中位數差異分析\n\
             - 哪些爆發次數的「平均-中位數」差異最大？右尾效應對投資策略有何啟示？\n\
             ### 3. 投資策略建議\n\
             - 根據期望值（兼顧樣本數與漲幅），哪個爆發次數區間是最佳投資標的？\n",
        );
        p.push_str(&format!("- {edition}的結果應該如何應用在實際投資中？\n"));
        p.push_str(
            "### 4. 實務操作建議\n\
             - 需要搭配哪些其他指標或條件來提高勝率？\n",
        );
        p
    }
}

pub struct TimingBrief<'a> {
    pub year: i32,
    pub metric: Metric,
    pub threshold: i32,
    pub report: &'a TimingReport,
    /// 已按 T-1月报酬排序的事件
    pub events: &'a [TimingEvent],
}

fn timing_event_table(events: &[TimingEvent]) -> String {
    let mut t = String::from(
        "| 代號 | 名稱 | 成長率% | T-1月% | T-1周% | T+1周% | T+1月% | 備註 |\n\
         |------|------|---------|--------|--------|--------|--------|------|\n",
    );
    for e in events.iter().take(TIMING_TABLE_ROWS) {
        t.push_str(&format!(
            "| {} | {} | {:.1} | {} | {} | {} | {} | {} |\n",
            e.stock_id,
            e.stock_name.as_deref().unwrap_or(""),
            e.growth,
            fmt_opt(e.pre_month, 2),
            fmt_opt(e.pre_week, 2),
            fmt_opt(e.after_week_1, 2),
            fmt_opt(e.after_month, 2),
            e.remark.as_deref().unwrap_or("").replace('|', "／"),
        ));
    }
    t
}

impl TimingBrief<'_> {
    pub fn render(&self) -> String {
        let r = self.report;
        let mean = |s: Stage| r.stage(s).map(|x| x.mean).unwrap_or(0.0);
        let stat = |s: Stage, f: fn(&crate::services::descriptive::DescriptiveStats) -> Option<f64>| {
            r.stage(s)
                .and_then(|x| x.stats.as_ref())
                .and_then(f)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        };

        let advanced: Vec<String> = r
            .stages
            .iter()
            .filter_map(|s| {
                s.stats.as_ref().map(|st| {
                    format!(
                        "{}: 均值={}%, 中位={}%, 偏度={}({}), 峰度={}({}), 變異係數={}%, 上漲機率={}%, IQR={}%, 右尾/左尾比={}",
                        s.label,
                        st.mean,
                        st.median,
                        st.skew,
                        st.skew_significance,
                        st.kurtosis,
                        st.kurtosis_significance,
                        st.cv.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string()),
                        st.win_rate,
                        st.iqr,
                        st.tail_ratio.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string()),
                    )
                })
            })
            .collect();

        let mut p = String::new();
        p.push_str("# 台股營收爆發行為量化分析報告\n");
        p.push_str("## 數據概要\n");
        p.push_str(&format!("- 分析年度：{}\n", self.year));
        p.push_str(&format!("- 樣本規模：{}檔符合{}%增長門檻\n", r.total, self.threshold));
        p.push_str(&format!("- 指標類型：{}\n", self.metric.label()));
        p.push_str(&format!("- 爆發門檻：{}%\n", self.threshold));
        p.push_str(&format!(
            "- 樣本特性：初次爆發(前一月未達標，本月首度衝破{}%)\n\n",
            self.threshold
        ));
        p.push_str("## 核心統計數據\n");
        p.push_str("【全階段平均報酬】：\n");
        p.push_str(&format!(
            "- 公告前一個月: {}% / 公告前一週: {}% / 公告當週: {}% / 公告後一週: {}% / 公告後一個月: {}%\n\n",
            mean(Stage::PreMonth),
            mean(Stage::PreWeek),
            mean(Stage::AnnounceWeek),
            mean(Stage::AfterWeek1),
            mean(Stage::AfterMonth)
        ));
        p.push_str("【進階統計特徵】：\n");
        if advanced.is_empty() {
            p.push_str("無進階統計數據\n");
        } else {
            p.push_str(&format!("{}\n", advanced.join("\n")));
        }
        p.push_str("\n【分佈摘要數據】：\n");
        p.push_str(&format!("T-1月分佈: {}\n", r.pre_month_distribution));
        p.push_str(&format!("T+1月分佈: {}\n\n", r.after_month_distribution));

        if !self.events.is_empty() {
            p.push_str(&format!(
                "## 個股明細（依T-1月報酬排序，前{}筆）\n",
                TIMING_TABLE_ROWS.min(self.events.len())
            ));
            p.push_str(&timing_event_table(self.events));
            p.push_str(
                "\n分析重點：\n\
                 1. 右尾效應分析：檢查T-1月的高報酬股票特徵\n\
                 2. 資訊不對稱：比較T-1月與T-1周的報酬分佈\n\
                 3. 策略有效性：評估T+1月報酬的持續性\n\n",
            );
        }

        p.push_str("## 診斷分析問題\n");
        p.push_str(&format!(
            "1. **資訊不對稱分析**：T-1月與T-1周的偏度 ({} vs {}) 是否顯示有人提早佈局？T-1月右尾/左尾比 ({}) 如何解讀？\n",
            stat(Stage::PreMonth, |s| Some(s.skew)),
            stat(Stage::PreWeek, |s| Some(s.skew)),
            stat(Stage::PreMonth, |s| s.tail_ratio),
        ));
        p.push_str(&format!(
            "2. **市場反應效率**：T周偏度 ({}) 與峰度 ({}) 顯示的是理性定價還是過度反應？T+1周均值 {}% 代表追加買盤還是利多出盡？\n",
            stat(Stage::AnnounceWeek, |s| Some(s.skew)),
            stat(Stage::AnnounceWeek, |s| Some(s.kurtosis)),
            mean(Stage::AfterWeek1),
        ));
        p.push_str(&format!(
            "3. **風險與報酬特徵**：變異係數由 T-1月 {}% 到 T+1月 {}% 反映什麼風險變化？\n",
            stat(Stage::PreMonth, |s| s.cv),
            stat(Stage::AfterMonth, |s| s.cv),
        ));
        p.push_str(&format!(
            "4. **投資策略建議**：給出最具期望值的進場點與出場點，停利停損可參考T周IQR {}%。\n",
            stat(Stage::AnnounceWeek, |s| Some(s.iqr)),
        ));
        p.push_str(&format!(
            "5. **年度比較洞察**：上漲機率由 T-1月 {}% 到 T+1月 {}%，{}年的公告效應有何特殊現象？\n",
            stat(Stage::PreMonth, |s| Some(s.win_rate)),
            stat(Stage::AfterMonth, |s| Some(s.win_rate)),
            self.year
        ));
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::timing::StockLinks;

    fn bin(order: i32, label: &str, decline: bool, stocks: i64, avg: f64) -> BinSummary {
        BinSummary {
            bin_order: order,
            bin_label: label.to_string(),
            decline,
            stock_count: stocks,
            avg_return: Some(avg),
            mean: Some(12.34),
            median: Some(8.0),
            std_dev: Some(20.0),
            min: Some(-40.0),
            max: Some(95.5),
            cv: Some(162.07),
            iqr: None,
            positive_rate: Some(61.5),
        }
    }

    fn heatmap_brief(basis: PriceBasis, summary: &[BinSummary]) -> String {
        HeatmapBrief {
            year: 2024,
            metric: Metric::Yoy,
            method: StatMethod::Median,
            basis,
            total_samples: 1200,
            summary,
            today: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        }
        .render()
    }

    #[test]
    fn close_brief_carries_settings_and_table() {
        let summary = vec![
            bin(5, "05. 下跌-60%至-50%", true, 200, -55.0),
            bin(11, "11. 上漲0-100%", false, 1000, 30.0),
        ];
        let p = heatmap_brief(PriceBasis::Close, &summary);
        assert!(p.contains("分析時間: 2025-01-15"));
        assert!(p.contains("分析年度: 2024年"));
        assert!(p.contains("成長指標: 年增率 (YoY)"));
        assert!(p.contains("總樣本數: 1,200檔"));
        assert!(p.contains("下跌股票比例: 16.7% (200檔)"));
        assert!(p.contains("**最慘的下跌區間**: 05. 下跌-60%至-50% (平均股價漲幅-55.0%"));
        assert!(p.contains("| 11. 上漲0-100% | 1000檔 | 30.0% | 12.3% | 8.0% | 20.0 | -40.0% | 95.5% | 162.07 | N/A | 61.5% |"));
    }

    #[test]
    fn high_brief_explains_basis() {
        let p = heatmap_brief(PriceBasis::High, &[]);
        assert!(p.contains("最高價版本"));
        assert!(p.contains("無統計數據"));
        assert!(!p.contains("最慘的下跌區間"));
    }

    #[test]
    fn probability_brief_limits_table_rows() {
        let groups: Vec<BurstGroupStats> = (1..=25)
            .rev()
            .map(|hits| BurstGroupStats {
                hits,
                stock_count: 3,
                avg_return: 10.0,
                median_return: 5.0,
                win_rate: 33.3,
                double_rate: 0.0,
                min_return: -1.0,
                max_return: 20.0,
                std_dev: 4.5,
            })
            .collect();
        let p = ProbabilityBrief {
            year: 2023,
            metric: Metric::Mom,
            basis: PriceBasis::High,
            low: 100,
            high: 1000,
            groups: &groups,
        }
        .render();
        assert!(p.contains("- **爆發門檻**: 100% 至 1000%"));
        assert!(p.contains("最高價 (極限版) (使用最高價計算漲幅)"));
        assert!(p.contains("| 25 | 3 | 10.0 | 5.0 | 33.3 |"));
        assert!(p.contains("| 6 | 3 |"));
        assert!(!p.contains("| 5 | 3 |"));
        assert!(p.contains("- 25/25 個區間(100.0%) 平均數 > 中位數"));
    }

    #[test]
    fn timing_brief_lists_stage_means_and_distributions() {
        let events: Vec<TimingEvent> = [4.0, -6.0, 1.5]
            .iter()
            .map(|v| TimingEvent {
                stock_id: "2330".to_string(),
                stock_name: Some("台積電".to_string()),
                report_month: "113_05".to_string(),
                base_date: TimingEvent::base_date_of("113_05"),
                growth: 150.0,
                remark: Some("AI|CoWoS".to_string()),
                links: StockLinks::for_stock("2330"),
                pre_month: Some(*v),
                pre_week: Some(1.0),
                announce_week: None,
                after_week_1: None,
                after_month: None,
            })
            .collect();
        let report = TimingReport::from_events(&events);
        let p = TimingBrief {
            year: 2024,
            metric: Metric::Yoy,
            threshold: 100,
            report: &report,
            events: &events,
        }
        .render();
        assert!(p.contains("樣本規模：3檔符合100%增長門檻"));
        assert!(p.contains("公告前一個月: -0.17%"));
        assert!(p.contains("T-1月: 均值="));
        assert!(p.contains("T+1月分佈: 無數據"));
        assert!(p.contains("## 個股明細（依T-1月報酬排序，前3筆）"));
        assert!(p.contains("| 2330 | 台積電 | 150.0 | 4.00 | 1.00 | N/A | N/A | AI／CoWoS |"));
        assert!(p.contains("3. 策略有效性：評估T+1月報酬的持續性"));
    }

    #[test]
    fn timing_table_stops_at_row_limit() {
        let events: Vec<TimingEvent> = (0..310)
            .map(|i| TimingEvent {
                stock_id: format!("{i:04}"),
                stock_name: None,
                report_month: "113_01".to_string(),
                base_date: None,
                growth: 100.0,
                remark: None,
                links: StockLinks::for_stock("0000"),
                pre_month: Some(1.0),
                pre_week: None,
                announce_week: None,
                after_week_1: None,
                after_month: None,
            })
            .collect();
        let table = timing_event_table(&events);
        assert_eq!(table.lines().count(), 2 + TIMING_TABLE_ROWS);
        assert!(table.contains("| 0299 |"));
        assert!(!table.contains("| 0300 |"));
    }

    #[test]
    fn fmt_opt_hides_missing_values() {
        assert_eq!(fmt_opt(Some(1.234), 1), "1.2");
        assert_eq!(fmt_opt(None, 2), "N/A");
        assert_eq!(fmt_opt(Some(f64::NAN), 2), "N/A");
    }

    #[test]
    fn links_carry_encoded_prompt() {
        let links = AiLinks::for_prompt("年增率 > 100%");
        assert_eq!(
            links.chatgpt,
            "https://chatgpt.com/?q=%E5%B9%B4%E5%A2%9E%E7%8E%87%20%3E%20100%25"
        );
        assert!(links.claude.starts_with("https://claude.ai/new?q=%E5%B9%B4"));
        assert_eq!(links.deepseek, "https://chat.deepseek.com/");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-1200), "-1,200");
    }
}
