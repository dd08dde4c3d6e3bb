pub mod server;
pub mod useradd;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    UserAdd(useradd::Args),
}

impl Action {
    /// Run the selected action to completion.
    /// # Errors
    /// Returns the action's error
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::handle(args).await,
            Self::UserAdd(args) => useradd::handle(args).await,
        }
    }
}
