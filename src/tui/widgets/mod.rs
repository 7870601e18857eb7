pub mod header;
pub mod ruler;
pub mod scene_tabs;
pub mod track_row;
