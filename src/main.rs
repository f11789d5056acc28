mod app;
mod core;
mod db;
mod theme;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("GrabDesk starting...");

    let conn = db::open_database(&db::db_path())?;

    iced::application(move || app::App::new(conn.clone()), app::App::update, app::App::view)
        .title(app::App::title)
        .subscription(app::App::subscription)
        .theme(app::App::theme)
        .window_size((1280.0, 800.0))
        .antialiasing(true)
        .run()?;

    Ok(())
}
