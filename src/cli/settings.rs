use anyhow::Result;
use clap::Subcommand;
use log::info;

use crate::cli::SubCommandExtend;
use crate::store::SettingsStore;
use crate::Opts;

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// 显示当前设置
    Show,
    /// 设置默认返回的文章数量
    Count { count: usize },
    /// 请求在下一次搜索前重建索引
    Rebuild,
    /// 设置管理员密码
    Password { password: String },
    /// 清除管理员密码
    ClearPassword,
}

impl SubCommandExtend for SettingsCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = SettingsStore::new(opts.dataset.app_config());
        match self {
            Self::Show => {
                let config = store.load();
                println!("num_results:    {}", config.num_results);
                println!("rebuild_index:  {}", config.rebuild_index);
                println!("admin_password: {}", if config.admin_password.is_empty() { "未设置" } else { "已设置" });
            }
            Self::Count { count } => {
                store.set_num_results(*count)?;
                info!("默认结果数量已设置为 {}", count);
            }
            Self::Rebuild => store.request_rebuild()?,
            Self::Password { password } => {
                store.set_password(password)?;
                info!("管理员密码已更新");
            }
            Self::ClearPassword => {
                store.clear_password()?;
                info!("管理员密码已清除");
            }
        }
        Ok(())
    }
}
