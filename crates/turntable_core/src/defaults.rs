//! crates/turntable_core/src/defaults.rs
//!
//! The bundled dataset used when neither local storage nor the backend has anything.

use crate::domain::{Category, CategoryId, CategoryType, Resource};

type Seed = (
    &'static str,
    &'static str,
    &'static str,
    &'static [(&'static str, &'static str, &'static str)],
);

const SEED: &[Seed] = &[
    (
        "project-scaffold",
        "脚手架开发",
        "搭建脚手架模板，提升项目初始化效率",
        &[
            ("cli-plugin", "Vue CLI 插件开发", "https://cli.vuejs.org/zh/dev-guide/plugin-dev.html"),
            ("plop", "Plop 自动化脚手架", "https://plopjs.com/"),
        ],
    ),
    (
        "component-lib",
        "组件库开发",
        "从零搭建可复用组件库体系",
        &[
            ("element-source", "Element 源码解析", "https://github.com/ElemeFE/element"),
            (
                "storybook",
                "Storybook 入门",
                "https://storybook.js.org/tutorials/intro-to-storybook/vue/zh-CN/get-started/",
            ),
        ],
    ),
    (
        "data-visualization",
        "数据大屏",
        "构建数据可视化大屏项目",
        &[
            ("echarts", "ECharts 官方文档", "https://echarts.apache.org/zh/index.html"),
            ("dataV", "DataV 可视化组件库", "http://datav.jiaminghi.com/"),
        ],
    ),
    (
        "admin-system",
        "后台管理系统",
        "掌握后台管理常用功能模块",
        &[
            ("vue-admin", "Vue Admin Template", "https://panjiachen.github.io/vue-element-admin-site/zh/"),
            ("permission", "权限控制实践", "https://juejin.cn/post/6844903664008486919"),
        ],
    ),
    (
        "monitoring",
        "前端监控平台",
        "搭建前端质量与性能监控体系",
        &[
            ("sentry", "Sentry 前端监控", "https://docs.sentry.io/platforms/javascript/"),
            ("performance", "Web 性能监控", "https://web.dev/performance-scoring/"),
        ],
    ),
    (
        "vue-source",
        "Vue 源码解析",
        "深入理解 Vue2/Vue3 运行机制",
        &[
            ("vue2-source", "Vue2 揭秘", "https://ustbhuangyi.github.io/vue-analysis/"),
            ("vue3-source", "Vue3 设计与实现", "https://vue3js.cn/start/"),
        ],
    ),
    (
        "build-tools",
        "打包工具与 Git",
        "掌握 Webpack、Vite 与 Git",
        &[
            ("webpack-doc", "Webpack 官方文档", "https://webpack.docschina.org/"),
            ("vite-doc", "Vite 指南", "https://cn.vitejs.dev/guide/"),
            ("git-pro", "Pro Git", "https://git-scm.com/book/zh/v2"),
        ],
    ),
    (
        "performance",
        "性能优化与调试",
        "提升性能与调试能力",
        &[
            ("lightouse", "Lighthouse 使用指南", "https://developer.chrome.com/docs/lighthouse/overview/"),
            ("debug", "Chrome DevTools 调试技巧", "https://developer.chrome.com/docs/devtools/"),
        ],
    ),
    (
        "tooling",
        "开发工具拓展",
        "TypeScript、Node.js、小程序等",
        &[
            ("typescript", "TypeScript 官方手册", "https://www.typescriptlang.org/zh/docs/"),
            ("nodejs", "Node.js 入门", "https://nodejs.dev/en/learn/"),
            (
                "mini-program",
                "微信小程序开发指南",
                "https://developers.weixin.qq.com/miniprogram/dev/framework/",
            ),
        ],
    ),
];

/// Builds a fresh copy of the bundled categories. All of them are `learning` and unselected.
pub fn default_categories() -> Vec<Category> {
    SEED.iter()
        .map(|(id, label, description, resources)| Category {
            id: CategoryId::new(*id),
            label: label.to_string(),
            description: description.to_string(),
            kind: CategoryType::Learning,
            selected: false,
            resources: resources
                .iter()
                .map(|(id, title, link)| Resource {
                    id: Some(id.to_string()),
                    title: title.to_string(),
                    link: link.to_string(),
                    completed: false,
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_dataset_is_well_formed() {
        let categories = default_categories();
        assert_eq!(categories.len(), 9);

        let ids: HashSet<_> = categories.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), categories.len());

        for category in &categories {
            assert!(!category.selected);
            assert!(!category.resources.is_empty());
            assert!(category.resources.iter().all(Resource::is_valid));
        }
    }
}
