use indicatif::{ProgressBar, ProgressStyle};

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {wide_msg}",
    )
    .expect("failed to build progress style")
}

/// 创建进度条，`show` 为 false 时不输出任何内容
pub fn progress_bar(show: bool) -> ProgressBar {
    match show {
        true => ProgressBar::new(0).with_style(pb_style()),
        false => ProgressBar::hidden(),
    }
}

/// 截断过长的字符串用于表格输出
pub fn ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_owned();
    }
    let mut out = s.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}
