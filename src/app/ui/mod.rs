mod controls;
mod details;
mod tutorial;
