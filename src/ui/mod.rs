pub mod badges;
pub mod detail_modal;
pub mod filters;
pub mod header;
pub mod history_table;
pub mod settings_modal;
pub mod toast;
