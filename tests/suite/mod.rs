mod config;
mod persistence;
mod routing;
mod scenarios;
