pub mod volkszaehler;
