//! Thin entrypoint for `keystone-manage`.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = keystone_manage::run().await;
    process::exit(exit_code);
}
