// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod lighthouse_runner;
pub mod pdf_renderer;
pub mod render_scripts;
pub mod traits;
