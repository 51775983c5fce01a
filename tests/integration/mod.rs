// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试主模块
///
/// 覆盖缓存存储、搜索聚合与爬取调度的端到端行为
mod helpers;

mod aggregator_http_test;
mod cache_store_test;
mod crawler_test;
