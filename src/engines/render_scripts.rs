// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 报告渲染时在页面内执行的脚本
//!
//! 展开类脚本只点击仍处于折叠状态的开关，重复执行不会把已展开的区块收起。

use serde::Deserialize;

/// 展开所有可折叠审计项，返回点击次数
pub const EXPAND_SECTIONS: &str = r#"(() => {
  let clicked = 0;
  document.querySelectorAll('.lh-chevron-container').forEach(el => {
    const section = el.closest('details');
    if (!section || !section.open) { el.click(); clicked++; }
  });
  return clicked;
})()"#;

/// 所有可折叠审计项均已展开
pub const SECTIONS_EXPANDED: &str = r#"Array.from(document.querySelectorAll('.lh-chevron-container'))
  .every(el => { const section = el.closest('details'); return !section || section.open; })"#;

/// 点击分组中的“显示更多”开关，返回点击次数
pub const SHOW_MORE_CLUMPS: &str = r#"(() => {
  let clicked = 0;
  document.querySelectorAll('.lh-clump-toggletext--show').forEach(el => {
    const clump = el.closest('details');
    if (!clump || !clump.open) { el.click(); clicked++; }
  });
  return clicked;
})()"#;

/// 所有分组均已展开
pub const CLUMPS_EXPANDED: &str = r#"Array.from(document.querySelectorAll('.lh-clump-toggletext--show'))
  .every(el => { const clump = el.closest('details'); return !clump || clump.open; })"#;

/// 隐藏页眉页脚并让所有链接失效，返回处理的链接数
pub const STRIP_CHROME: &str = r#"(() => {
  ['lh-footer', 'lh-topbar'].forEach(className => {
    document.querySelectorAll('.' + className).forEach(el => {
      el.style.display = 'none';
    });
  });
  const anchors = document.querySelectorAll('a');
  anchors.forEach(el => {
    el.removeAttribute('href');
    el.removeAttribute('target');
    el.style.pointerEvents = 'none';
    el.style.textDecoration = 'none';
    el.style.color = 'inherit';
  });
  return anchors.length;
})()"#;

/// 统计导出前仍带链接的锚点和可见的页眉页脚
pub const CHROME_STATE: &str = r#"(() => {
  const chrome = Array.from(document.querySelectorAll('.lh-footer, .lh-topbar'))
    .filter(el => window.getComputedStyle(el).display !== 'none').length;
  return { anchors: document.querySelectorAll('a[href]').length, chrome };
})()"#;

/// 页面加载完成，不要求报告主体存在
pub const DOCUMENT_COMPLETE: &str = "document.readyState === 'complete'";

/// 页面加载完成且报告主体已渲染
pub fn ready_probe(selector: &str) -> String {
    // JSON string literals are valid JS string literals
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"body\"".to_string());
    format!("document.readyState === 'complete' && document.querySelector({quoted}) !== null")
}

/// `CHROME_STATE` 的返回值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ChromeState {
    pub anchors: u64,
    pub chrome: u64,
}

impl ChromeState {
    pub fn is_clean(&self) -> bool {
        self.anchors == 0 && self.chrome == 0
    }
}
