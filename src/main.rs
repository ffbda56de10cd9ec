mod app;
mod debate;
mod engine;
mod util;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding nodes.json, edges.json and the optional
    /// authors.json / tutorial.json files.
    #[arg(long, default_value = "data")]
    data_dir: String,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "agora",
        options,
        Box::new(move |cc| Ok(Box::new(app::DebateApp::new(cc, args.data_dir.clone())))),
    )
}
