mod health_test;
mod workspaces;
