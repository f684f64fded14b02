mod helpers;
mod polling;
mod projects;
mod secrets;
