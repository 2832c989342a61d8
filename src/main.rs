// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use nova_exporter::api::metrics::MetricRegistry;
use nova_exporter::api::{init_tracing, run_once_mode, run_serve_mode};
use nova_exporter::cli::{Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Some(Commands::Serve(args)) => run_serve_mode(&args).await,
        Some(Commands::Once(args)) => run_once_mode(&args).await.map(|metrics| {
            print!("{metrics}");
        }),
        Some(Commands::ListMetrics(args)) => {
            let disabled = args.disabled_metrics.iter().cloned().collect();
            print!("{}", MetricRegistry::new(&args.prefix, &disabled).describe());
            Ok(())
        }
        None => run_serve_mode(&ServeArgs::default()).await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
