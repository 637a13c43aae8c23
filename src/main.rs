// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由调度服务器
//!
//! 将调度器挂载在一个基于 Tokio 运行时的最小 HTTP/1.1 服务器之后：
//! - 从 TOML 配置文件加载路由表、中间件注册表与依赖绑定
//! - 启动阶段写入依赖绑定表，之后调度器以只读方式在连接间共享
//! - 每个连接读取一个请求，完成一次同步分发后写回响应并关闭
//! - 后台管理控制台（CLI 指令交互）

mod controllers;

use dispatcher::{
    config::Config, middleware::MiddlewareRegistry, param::HEAD_METHOD, request::Request,
    response::Response, route::RouteTable, Dispatcher,
};

use log::{debug, error, info};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{Arc, Mutex},
    time::Instant,
};

const CONFIG_FILE: &str = "config/development.toml";

/// 所有连接共享的只读状态
struct Shared {
    table: RouteTable,
    middlewares: MiddlewareRegistry,
    dispatcher: Dispatcher,
}

/// # 程序入口点
///
/// 加载配置、初始化日志、构建调度器并启动主事件循环。
fn main() {
    let config = match Config::from_toml(CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("无法载入配置文件：{}", e);
            return;
        }
    };

    // 日志系统：log4rs 通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file(config.log_config(), Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
        return;
    }
    info!("配置文件已载入");

    let table = match config.route_table() {
        Ok(table) => table,
        Err(e) => {
            error!("路由表构建失败：{}", e);
            return;
        }
    };
    info!("路由表已构建，共{}条路由", table.len());

    // 绑定表必须在开始接收连接之前写入
    let mut dispatcher = Dispatcher::new(controllers::container(), controllers::middleware_catalog());
    dispatcher.set_dependency_map(config.bindings().clone());
    info!("依赖绑定表已写入，共{}条绑定", config.bindings().len());

    let shared = Arc::new(Shared {
        table,
        middlewares: config.middlewares().clone(),
        dispatcher,
    });

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };
    runtime.block_on(serve(config, shared));
}

async fn serve(config: Config, shared: Arc<Shared>) {
    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let socket = SocketAddrV4::new(address, port);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    // shutdown_flag: 用于优雅停机
    // active_connection: 追踪当前并发连接数
    let shutdown_flag = Arc::new(Mutex::new(false));
    let active_connection = Arc::new(Mutex::new(0u32));

    tokio::spawn(console(
        Arc::clone(&shutdown_flag),
        Arc::clone(&active_connection),
        Arc::clone(&shared),
    ));

    let mut id: u128 = 0;
    loop {
        if shutdown_flag.lock().map(|flag| *flag).unwrap_or(true) {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let active_connection_arc = Arc::clone(&active_connection);
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Ok(mut lock) = active_connection_arc.lock() {
                *lock += 1;
            }
            handle_connection(&mut stream, id, &shared).await;
            if let Ok(mut lock) = active_connection_arc.lock() {
                *lock -= 1;
            }
        });
        id += 1;
    }
}

/// 后台管理控制台，提供 `stop`、`status`、`help` 指令
async fn console(
    shutdown_flag: Arc<Mutex<bool>>,
    active_connection: Arc<Mutex<u32>>,
    shared: Arc<Shared>,
) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                if let Ok(mut flag) = shutdown_flag.lock() {
                    *flag = true;
                }
                println!("停机指令已激活，服务器将在处理完下一个请求后关闭...");
                break;
            }
            "help" => {
                println!("== Dispatcher Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("help   - 显示此帮助信息");
                println!("=====================");
            }
            "status" => {
                let active_count = active_connection.lock().map(|c| *c).unwrap_or(0);
                println!("== Dispatcher 状态 ==");
                println!("当前活跃连接数: {}", active_count);
                println!("路由数: {}", shared.table.len());
                let container = shared.dispatcher.container();
                let mut bindings: Vec<_> = container.bindings().iter().collect();
                bindings.sort();
                for (interface, concrete) in bindings {
                    println!("绑定: {} -> {}", interface, concrete);
                }
                println!("=====================");
            }
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}

/// # 连接处理器
///
/// 读取并解析请求、执行一次分发，再将结果写回客户端。
async fn handle_connection(stream: &mut TcpStream, id: u128, shared: &Shared) {
    let mut buffer = vec![0; 4096];

    if let Err(e) = stream.readable().await {
        error!("[ID{}]等待TCPStream可读时遇到错误: {}", id, e);
        return;
    }
    let n = match stream.try_read(&mut buffer) {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，{}字节", id, n);

    let start_time = Instant::now();
    let response = match Request::try_from(&buffer[..n], id) {
        Ok(request) => {
            let response = respond(&request, id, shared);
            info!(
                "[ID{}] {}, {}, {}, {}, {}",
                id,
                request.version(),
                request.target(),
                request.method(),
                response.status_code(),
                request.user_agent(),
            );
            response
        }
        Err(e) => Response::from_exception(&e, id),
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    if let Err(e) = stream.flush().await {
        error!("[ID{}]刷新TCPStream失败: {}", id, e);
    }
}

fn respond(request: &Request, id: u128, shared: &Shared) -> Response {
    let outcome = shared.dispatcher.dispatch(
        &shared.table,
        &shared.middlewares,
        request.method(),
        request.target(),
    );
    let mut response = match outcome {
        Ok(outcome) => Response::from_outcome(&outcome),
        Err(e) => {
            if !e.is_recoverable() {
                error!("[ID{}]分发过程中出现不可恢复的错误：{}", id, e);
            }
            Response::from_exception(&e, id)
        }
    };
    if request.method() == HEAD_METHOD {
        response.head_only();
    }
    response
}
