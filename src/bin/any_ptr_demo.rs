use any_ptr::{make_any, AnyPtr};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
	let stdout = ConsoleAppender::builder()
		.encoder(Box::new(PatternEncoder::new("{m}{n}")))
		.build();
	let config = Config::builder()
		.appender(Appender::builder().build("stdout", Box::new(stdout)))
		.build(Root::builder().appender("stdout").build(level))?;
	log4rs::init_config(config)?;
	Ok(())
}

fn main() {
	if let Err(err) = init_logging(LevelFilter::Info) {
		eprintln!("Failed to initialise logging: {err}");
	}

	let mut doubles = Box::new(Vec::<f64>::new());
	doubles.push(1.1);
	doubles.push(2.2);
	doubles.push(3.3);

	let ptrs = vec![
		AnyPtr::from_box(doubles),
		AnyPtr::new(vec![4i32, 5, 6]),
		make_any::<Vec<f64>, _>([7.7, 8.8, 9.9]),
	];

	for ptr in &ptrs {
		if let Some(doubles) = ptr.convert::<Vec<f64>>() {
			info!("Runtime cast to Vec<f64> successful!");
			for dbl in doubles.iter() {
				info!("{dbl}");
			}
		} else if let Some(ints) = ptr.convert::<Vec<i32>>() {
			info!("Runtime cast to Vec<i32> successful!");
			for int in ints.iter() {
				info!("{int}");
			}
		} else {
			info!("Unsuccessful runtime cast from AnyPtr");
		}
	}
}
