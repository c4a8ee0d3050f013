use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::SubCommandExtend;
use crate::config::SearchOptions;
use crate::{EngineBuilder, Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 启动时立即构建索引，而不是等到第一次搜索
    #[arg(long)]
    pub preload: bool,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let engine = EngineBuilder::new(opts.dataset.clone())
            .over_fetch(self.search.over_fetch)
            .open();

        if self.preload {
            let catalog = tokio::task::block_in_place(|| engine.ensure_index())?;
            info!("索引已加载: {} 篇文章, {} 张图片", catalog.article_count(), catalog.size());
        }

        // 创建应用状态
        let state = server::AppState::new(engine, self.search.count.map(|c| c as usize));

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
