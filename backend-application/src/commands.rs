pub mod scan_commands;
